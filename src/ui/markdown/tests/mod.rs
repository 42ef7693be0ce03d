mod blocks;

use super::{Block, Inline};

pub(super) fn text(s: &str) -> Inline {
    Inline::Text(s.to_string())
}

pub(super) fn math(tex: &str, display: bool) -> Inline {
    Inline::Math {
        tex: tex.to_string(),
        display,
    }
}

pub(super) fn paragraph(content: Vec<Inline>) -> Block {
    Block::Paragraph(content)
}
