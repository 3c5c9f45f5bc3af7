use lazy_static::lazy_static;
use style::Style;

pub mod color;
pub mod error;
pub mod node;
pub mod shared_str;
pub mod style;
pub mod visitor;

lazy_static! {
    // Stock rendering style; data/resources/style.json takes precedence
    pub static ref DEFAULT_STYLE: Style = style::active_style();
}
