//! Morse "SOS" blink timing for the fatal error signal.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blink {
    pub on: bool,
    pub duration_ms: u32,
}

const DOT: u32 = 1;
const DASH: u32 = 3;
const SYMBOL_GAP: u32 = 1;
const LETTER_GAP: u32 = 3;
const WORD_GAP: u32 = 7;

/// S, O, S as mark lengths in units.
const LETTERS: [&[u32]; 3] = [&[DOT, DOT, DOT], &[DASH, DASH, DASH], &[DOT, DOT, DOT]];

/// One full "SOS" word followed by the inter-word pause. Repeat forever.
pub fn sos_pattern(unit_ms: u32) -> Vec<Blink> {
    let mut pattern = Vec::with_capacity(18);

    for (letter_index, marks) in LETTERS.iter().enumerate() {
        for (mark_index, &mark) in marks.iter().enumerate() {
            pattern.push(Blink { on: true, duration_ms: mark * unit_ms });

            let gap = if mark_index + 1 < marks.len() {
                SYMBOL_GAP
            } else if letter_index + 1 < LETTERS.len() {
                LETTER_GAP
            } else {
                WORD_GAP
            };
            pattern.push(Blink { on: false, duration_ms: gap * unit_ms });
        }
    }

    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_shape() {
        let pattern = sos_pattern(100);
        assert_eq!(pattern.len(), 18);

        let marks: Vec<u32> = pattern.iter().filter(|b| b.on).map(|b| b.duration_ms).collect();
        assert_eq!(marks, vec![100, 100, 100, 300, 300, 300, 100, 100, 100]);
        assert!(pattern.iter().step_by(2).all(|b| b.on));
        assert!(pattern.iter().skip(1).step_by(2).all(|b| !b.on));
    }

    #[test]
    fn test_gaps() {
        let pattern = sos_pattern(50);
        assert_eq!(pattern[1].duration_ms, 50);
        assert_eq!(pattern[5].duration_ms, 150);
        assert_eq!(pattern[17].duration_ms, 350);
    }

    #[test]
    fn test_word_length_in_units() {
        // 3 dots + 3 dashes + 3 dots, 6 symbol gaps, 2 letter gaps, 1 word gap
        let total: u32 = sos_pattern(1).iter().map(|b| b.duration_ms).sum();
        assert_eq!(total, 3 + 9 + 3 + 6 + 6 + 7);
    }
}
