//! NRZI line decoding for AX.25 over AFSK.
//!
//! AX.25 transmitters send a zero as a change of tone and a one as no
//! change. The sliced level therefore has to be compared against the
//! previous decision to recover the data bit before it reaches the HDLC
//! deframer.
//!
//! A flag octet (`01111110`) thus carries two transitions, which is what
//! keeps the receive PLL trained during preambles and between frames.

/// Stateful NRZI decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NrziDecoder {
    last: bool,
}

impl NrziDecoder {
    /// Creates a decoder whose previous level is low.
    pub const fn new() -> Self {
        Self { last: false }
    }

    /// Decodes the level sampled at one decision instant.
    ///
    /// Returns `true` when the level matches the previous decision.
    pub fn decode(&mut self, level: bool) -> bool {
        let bit = level == self.last;
        self.last = level;
        bit
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encodes data bits as NRZI levels, starting from a low line.
    pub(crate) fn nrzi_encode(bits: &[bool]) -> Vec<bool> {
        let mut level = false;
        bits.iter()
            .map(|&bit| {
                if !bit {
                    level = !level;
                }
                level
            })
            .collect()
    }

    #[test]
    fn test_decode_transitions() {
        let mut nrzi = NrziDecoder::new();
        assert!(nrzi.decode(false));
        assert!(!nrzi.decode(true));
        assert!(nrzi.decode(true));
        assert!(!nrzi.decode(false));
    }

    #[test]
    fn test_decode_inverts_encode() {
        let bits = [
            false, true, true, true, true, true, true, false, true, false, false, true,
        ];
        let mut nrzi = NrziDecoder::default();
        let decoded: Vec<bool> = nrzi_encode(&bits)
            .into_iter()
            .map(|level| nrzi.decode(level))
            .collect();
        assert_eq!(decoded, bits);
    }
}
