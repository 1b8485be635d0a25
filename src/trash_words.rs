//! Trash word removal
//!
//! Release names carry a lot of noise behind the actual episode title:
//! language markers, release groups, codecs and resolutions. This module
//! strips that noise from an already cleaned episode name.

/// Tokens that never belong to an episode title
///
/// Compared case-insensitively against whole words.
pub const TRASH_WORDS: &[&str] = &[
    "German", "Dubbed", "DVDRip", "HDTVRip", "XviD", "ITG", "TVR", "inspired", "HDRip",
    "AMBiTiOUS", "RSG", "SiGHT", "SATRip", "WS", "TVS", "RiP", "READ", "GERMAN", "dTV", "aTV",
    "iNTERNAL", "CRoW", "MSE", "c0nFuSed", "UTOPiA", "scum", "EXPiRED", "BDRiP", "HDTV",
    "iTunesHD", "720p", "x264", "h264", "CRiSP", "euHD", "WEBRiP", "ZZGtv", "ARCHiV", "DD20",
    "Prim3time", "Nfo", "Repack", "SiMPTY", "BLURAYRiP", "BluRay", "DELiCiOUS", "Synced",
    "UNDELiCiOUS", "fBi", "CiD", "iTunesHDRip", "RedSeven", "OiNK", "idTV", "DL", "DD51", "AC3",
    "1080p", "WEB", "DD5",
];

/// Consecutive purges after which the rest of the name is dropped
const MAX_PURGES: usize = 2;

fn is_trash_word(word: &str) -> bool {
    TRASH_WORDS
        .iter()
        .any(|trash| trash.eq_ignore_ascii_case(word))
}

/// Removes trash words from a cleaned episode name
///
/// A single trash word between two title words is put back, since it was
/// most likely part of the title ("Die German Erinnerungen"). Two trash
/// words in a row stay removed, and once a third one was purged everything
/// behind it is dropped as well.
///
/// # Examples
///
/// ```
/// assert_eq!(
///     series::remove_trash_words("Die German Erinnerungen German Dubbed BLURAYRiP"),
///     "Die German Erinnerungen"
/// );
/// ```
pub fn remove_trash_words(name: &str) -> String {
    let mut purge_count = 0;
    let mut last_purge: Option<&str> = None;
    let mut valid_words = Vec::new();

    for word in name.split_whitespace() {
        if purge_count > MAX_PURGES {
            break;
        }

        if is_trash_word(word) {
            purge_count += 1;
            last_purge = Some(word);
            continue;
        }

        if purge_count == 1 {
            if let Some(purged) = last_purge.take() {
                valid_words.push(purged);
            }
            purge_count = 0;
        }

        valid_words.push(word);
    }

    valid_words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remove_trash_words_table() {
        let cases = [
            // single purge followed by a title word is restored
            ("Die German Erinnerungen", "Die German Erinnerungen"),
            // restore followed by a terminal double purge
            (
                "Die German Erinnerungen German Dubbed BLURAYRiP",
                "Die German Erinnerungen",
            ),
            // three purges in a row cut off the rest
            (
                "Gueterzug nach Miami GERMAN DUBBED DL 720p WebHD h264 euHD",
                "Gueterzug nach Miami",
            ),
            // a trailing single purge is never restored
            ("Beziehungsbeschwerden GERMAN", "Beziehungsbeschwerden"),
            (
                "Getruebte Erinnerungen German Dubbed",
                "Getruebte Erinnerungen",
            ),
            // two purges keep the following word but not the purged ones
            ("Title German Dubbed Rest", "Title Rest"),
            // purge count stays at two, so the next purge leads to a cut
            ("A German Dubbed B HDTV C D", "A B"),
            // restore resets the counter
            ("A German B German C", "A German B German C"),
            // leading trash word followed by a title word is restored
            ("German Title", "German Title"),
            ("Dies ist ein Test German Dubbed BLURAYRiP", "Dies ist ein Test"),
            ("", ""),
            ("  spaced   words ", "spaced words"),
            ("x264", ""),
        ];

        for (input, expected) in cases {
            assert_eq!(remove_trash_words(input), expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_trash_words_match_case_insensitively() {
        assert!(is_trash_word("german"));
        assert!(is_trash_word("BLURAYRIP"));
        assert!(is_trash_word("X264"));
        assert!(!is_trash_word("Germany"));
        assert!(!is_trash_word("Erinnerungen"));
    }
}
