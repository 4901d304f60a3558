//! Merges inbound text fragments into the single in-progress assistant turn.
//!
//! The accumulator is the only path through which the pending assistant index
//! is produced: the first fragment of an exchange appends a new assistant
//! turn, every later fragment extends that turn's text in place, strictly in
//! arrival order.

use crate::types::MessageLog;

/// Folds one fragment into `log`.
///
/// With no pending index a new assistant turn is appended whose text is
/// `fragment`, and its index is returned. With a pending index the fragment
/// is concatenated onto that turn's existing text and the same index is
/// returned. Fragments are never dropped, reordered, or deduplicated, and
/// this operation never fails; a transport-level decoding fault is the
/// transport's concern.
pub fn accept(log: &mut MessageLog, pending: Option<usize>, fragment: &str) -> usize {
    match pending {
        None => log.push_assistant(fragment),
        Some(index) => {
            log.append_to(index, fragment);
            index
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fragment_creates_assistant_turn() {
        let mut log = MessageLog::new();
        log.push_user("question");

        let idx = accept(&mut log, None, "answer");
        assert_eq!(idx, 1);
        assert_eq!(log.len(), 2);
        assert!(log.get(idx).unwrap().is_assistant());
        assert_eq!(log.get(idx).unwrap().text, "answer");
    }

    #[test]
    fn later_fragments_extend_the_same_turn() {
        let mut log = MessageLog::new();
        log.push_user("question");

        let mut pending = None;
        for fragment in ["Hel", "lo, ", "wor", "ld"] {
            pending = Some(accept(&mut log, pending, fragment));
        }

        assert_eq!(log.len(), 2);
        assert_eq!(log.get(1).unwrap().text, "Hello, world");
    }

    #[test]
    fn fragment_boundaries_do_not_alter_concatenation() {
        let whole = "The quick brown fox jumps over the lazy dog";
        for split in [1, 7, 20, whole.len() - 1] {
            let mut log = MessageLog::new();
            let first = accept(&mut log, None, &whole[..split]);
            accept(&mut log, Some(first), &whole[split..]);
            assert_eq!(log.get(first).unwrap().text, whole);
        }
    }

    #[test]
    fn empty_fragment_still_creates_a_turn() {
        let mut log = MessageLog::new();
        let idx = accept(&mut log, None, "");
        assert_eq!(log.get(idx).unwrap().text, "");
        accept(&mut log, Some(idx), "x");
        assert_eq!(log.get(idx).unwrap().text, "x");
    }
}
