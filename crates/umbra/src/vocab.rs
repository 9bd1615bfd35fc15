//! SVG element and attribute names the engine reads and writes.

pub(crate) const USE: &str = "use";
pub(crate) const GROUP: &str = "g";
pub(crate) const SYMBOL: &str = "symbol";
pub(crate) const SVG: &str = "svg";

pub(crate) const HREF: &str = "href";
pub(crate) const XLINK_HREF: &str = "xlink:href";
pub(crate) const X: &str = "x";
pub(crate) const Y: &str = "y";
pub(crate) const WIDTH: &str = "width";
pub(crate) const HEIGHT: &str = "height";
pub(crate) const TRANSFORM: &str = "transform";
pub(crate) const VISIBILITY: &str = "visibility";

pub(crate) const HIDDEN: &str = "hidden";
pub(crate) const DEFAULT: &str = "default";
