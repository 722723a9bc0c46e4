use crate::foundation::math::{channel, div255, pack};

/// Compositing operator applied between the paint source and the target.
///
/// All formulas work on premultiplied colors.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
pub enum Operator {
    /// Replace the destination.
    Src,
    /// Source over destination.
    #[default]
    SrcOver,
    /// Source where the destination is opaque.
    SrcIn,
    /// Source where the destination is transparent.
    SrcOut,
    /// Source over destination, limited to the destination's coverage.
    SrcAtop,
    /// Keep the destination.
    Dst,
    /// Destination over source.
    DstOver,
    /// Destination where the source is opaque.
    DstIn,
    /// Destination where the source is transparent.
    DstOut,
    /// Destination over source, limited to the source's coverage.
    DstAtop,
    /// Non-overlapping parts of source and destination.
    Xor,
    /// Transparent black.
    Clear,
    /// Saturating sum.
    Add,
    /// Product of source and destination.
    Multiply,
    /// Inverse product of inverses.
    Screen,
    /// Darker of source and destination.
    Darken,
    /// Lighter of source and destination.
    Lighten,
    /// Absolute difference.
    Difference,
}

impl Operator {
    /// Every operator in declaration order.
    pub const ALL: [Operator; 18] = [
        Operator::Src,
        Operator::SrcOver,
        Operator::SrcIn,
        Operator::SrcOut,
        Operator::SrcAtop,
        Operator::Dst,
        Operator::DstOver,
        Operator::DstIn,
        Operator::DstOut,
        Operator::DstAtop,
        Operator::Xor,
        Operator::Clear,
        Operator::Add,
        Operator::Multiply,
        Operator::Screen,
        Operator::Darken,
        Operator::Lighten,
        Operator::Difference,
    ];

    /// Operator with the given declaration index.
    pub fn from_index(i: usize) -> Option<Operator> {
        Self::ALL.get(i).copied()
    }

    /// Per-pixel blend function for this operator.
    pub(crate) fn blend_fn(self) -> fn(u32, u32) -> u32 {
        match self {
            Operator::Src => |_, s| s,
            Operator::SrcOver => src_over,
            Operator::SrcIn => |d, s| each(d, s, |_, sc, da, _| div255(sc * da)),
            Operator::SrcOut => |d, s| each(d, s, |_, sc, da, _| div255(sc * (255 - da))),
            Operator::SrcAtop => {
                |d, s| each(d, s, |dc, sc, da, sa| div255(sc * da + dc * (255 - sa)))
            }
            Operator::Dst => |d, _| d,
            Operator::DstOver => |d, s| each(d, s, |dc, sc, da, _| dc + div255(sc * (255 - da))),
            Operator::DstIn => |d, s| each(d, s, |dc, _, _, sa| div255(dc * sa)),
            Operator::DstOut => |d, s| each(d, s, |dc, _, _, sa| div255(dc * (255 - sa))),
            Operator::DstAtop => {
                |d, s| each(d, s, |dc, sc, da, sa| div255(dc * sa + sc * (255 - da)))
            }
            Operator::Xor => {
                |d, s| each(d, s, |dc, sc, da, sa| div255(sc * (255 - da) + dc * (255 - sa)))
            }
            Operator::Clear => |_, _| 0,
            Operator::Add => |d, s| each(d, s, |dc, sc, _, _| dc + sc),
            Operator::Multiply => |d, s| {
                each(d, s, |dc, sc, da, sa| {
                    div255(sc * dc + sc * (255 - da) + dc * (255 - sa))
                })
            },
            Operator::Screen => |d, s| each(d, s, |dc, sc, _, _| sc + dc - div255(sc * dc)),
            Operator::Darken => |d, s| {
                separable(d, s, |dc, sc, da, sa| {
                    (sc + dc).saturating_sub(div255((sc * da).max(dc * sa)))
                })
            },
            Operator::Lighten => |d, s| {
                separable(d, s, |dc, sc, da, sa| {
                    (sc + dc).saturating_sub(div255((sc * da).min(dc * sa)))
                })
            },
            Operator::Difference => |d, s| {
                separable(d, s, |dc, sc, da, sa| {
                    (sc + dc).saturating_sub(2 * div255((sc * da).min(dc * sa)))
                })
            },
        }
    }

    /// Blend premultiplied `src` onto premultiplied `dst`.
    pub fn blend(self, dst: u32, src: u32) -> u32 {
        (self.blend_fn())(dst, src)
    }
}

fn src_over(d: u32, s: u32) -> u32 {
    let sa = s >> 24;
    match sa {
        0xFF => s,
        0 => d,
        _ => each(d, s, |dc, sc, _, sa| sc + div255(dc * (255 - sa))),
    }
}

// Apply `f(dc, sc, da, sa)` to all four channels, alpha included.
#[inline]
fn each(d: u32, s: u32, f: impl Fn(u32, u32, u32, u32) -> u32) -> u32 {
    let (da, sa) = (d >> 24, s >> 24);
    pack(
        f(da, sa, da, sa),
        f(channel(d, 16), channel(s, 16), da, sa),
        f(channel(d, 8), channel(s, 8), da, sa),
        f(channel(d, 0), channel(s, 0), da, sa),
    )
}

// Color channels through `f`, alpha through the source-over union.
#[inline]
fn separable(d: u32, s: u32, f: impl Fn(u32, u32, u32, u32) -> u32) -> u32 {
    let (da, sa) = (d >> 24, s >> 24);
    let a = sa + da - div255(sa * da);
    let a = a.min(255);
    pack(
        a,
        f(channel(d, 16), channel(s, 16), da, sa).min(a),
        f(channel(d, 8), channel(s, 8), da, sa).min(a),
        f(channel(d, 0), channel(s, 0), da, sa).min(a),
    )
}

#[cfg(test)]
#[path = "../../tests/unit/composite/operator.rs"]
mod tests;
