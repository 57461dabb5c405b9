//! evex compressed displacement.
//!
//! an evex memory operand with a one-byte displacement stores `disp / N`, where `N` depends on
//! the instruction's tuple type and, for some tuple types, on `evex.b` and `evex.W`.

#[allow(non_camel_case_types)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[rustfmt::skip]
pub enum TupleType {
    None,
    Full_128, Full_256, Full_512,
    Half_128, Half_256, Half_512,
    Full_Mem_128, Full_Mem_256, Full_Mem_512,
    Tuple1_Scalar,
    Tuple1_Scalar_1, Tuple1_Scalar_2, Tuple1_Scalar_4, Tuple1_Scalar_8,
    Tuple1_Fixed_4, Tuple1_Fixed_8,
    Tuple2, Tuple4, Tuple8,
    Tuple1_4X,
    Half_Mem_128, Half_Mem_256, Half_Mem_512,
    Quarter_Mem_128, Quarter_Mem_256, Quarter_Mem_512,
    Eighth_Mem_128, Eighth_Mem_256, Eighth_Mem_512,
    Mem128,
    MOVDDUP_128, MOVDDUP_256, MOVDDUP_512,
}

/// how a tuple type scales its displacement.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Disp8Rule {
    Fixed(u8),
    /// `full` without broadcast, otherwise the element size picked by `W`.
    Broadcast { w0: u8, w1: u8, full: u8 },
    /// `(W=0, W=1)`.
    ByW(u8, u8),
}

use Disp8Rule::*;

#[rustfmt::skip]
const RULES: [Disp8Rule; 34] = [
    /* None            */ Fixed(1),
    /* Full_128        */ Broadcast { w0: 4, w1: 8, full: 16 },
    /* Full_256        */ Broadcast { w0: 4, w1: 8, full: 32 },
    /* Full_512        */ Broadcast { w0: 4, w1: 8, full: 64 },
    /* Half_128        */ Broadcast { w0: 4, w1: 4, full: 8 },
    /* Half_256        */ Broadcast { w0: 4, w1: 4, full: 16 },
    /* Half_512        */ Broadcast { w0: 4, w1: 4, full: 32 },
    /* Full_Mem_128    */ Fixed(16),
    /* Full_Mem_256    */ Fixed(32),
    /* Full_Mem_512    */ Fixed(64),
    /* Tuple1_Scalar   */ ByW(4, 8),
    /* Tuple1_Scalar_1 */ Fixed(1),
    /* Tuple1_Scalar_2 */ Fixed(2),
    /* Tuple1_Scalar_4 */ Fixed(4),
    /* Tuple1_Scalar_8 */ Fixed(8),
    /* Tuple1_Fixed_4  */ Fixed(4),
    /* Tuple1_Fixed_8  */ Fixed(8),
    /* Tuple2          */ ByW(8, 16),
    /* Tuple4          */ ByW(16, 32),
    /* Tuple8          */ Fixed(32),
    /* Tuple1_4X       */ Fixed(16),
    /* Half_Mem_128    */ Fixed(8),
    /* Half_Mem_256    */ Fixed(16),
    /* Half_Mem_512    */ Fixed(32),
    /* Quarter_Mem_128 */ Fixed(4),
    /* Quarter_Mem_256 */ Fixed(8),
    /* Quarter_Mem_512 */ Fixed(16),
    /* Eighth_Mem_128  */ Fixed(2),
    /* Eighth_Mem_256  */ Fixed(4),
    /* Eighth_Mem_512  */ Fixed(8),
    /* Mem128          */ Fixed(16),
    /* MOVDDUP_128     */ Fixed(8),
    /* MOVDDUP_256     */ Fixed(32),
    /* MOVDDUP_512     */ Fixed(64),
];

impl TupleType {
    /// the `N` of disp8*N.
    ///
    /// `Tuple8` is only defined for `W=0`; its factor is the same regardless.
    pub fn disp8n(self, broadcast: bool, w: bool) -> u32 {
        let n = match RULES[self as usize] {
            Fixed(n) => n,
            Broadcast { w0, w1, full } => match (broadcast, w) {
                (false, _) => full,
                (true, false) => w0,
                (true, true) => w1,
            },
            ByW(w0, w1) => {
                if w {
                    w1
                } else {
                    w0
                }
            }
        };

        n as u32
    }

    /// pick the variant of a vector-length dependent tuple type for the given evex `L'L`.
    /// scalar tuple types are returned as is.
    pub(crate) fn with_vector_length(self, vl: u32) -> TupleType {
        use TupleType::*;

        let family: [TupleType; 3] = match self {
            Full_128 | Full_256 | Full_512 => [Full_128, Full_256, Full_512],
            Half_128 | Half_256 | Half_512 => [Half_128, Half_256, Half_512],
            Full_Mem_128 | Full_Mem_256 | Full_Mem_512 => {
                [Full_Mem_128, Full_Mem_256, Full_Mem_512]
            }
            Half_Mem_128 | Half_Mem_256 | Half_Mem_512 => {
                [Half_Mem_128, Half_Mem_256, Half_Mem_512]
            }
            Quarter_Mem_128 | Quarter_Mem_256 | Quarter_Mem_512 => {
                [Quarter_Mem_128, Quarter_Mem_256, Quarter_Mem_512]
            }
            Eighth_Mem_128 | Eighth_Mem_256 | Eighth_Mem_512 => {
                [Eighth_Mem_128, Eighth_Mem_256, Eighth_Mem_512]
            }
            MOVDDUP_128 | MOVDDUP_256 | MOVDDUP_512 => [MOVDDUP_128, MOVDDUP_256, MOVDDUP_512],
            scalar => return scalar,
        };

        family[(vl as usize).min(2)]
    }
}
