mod html;

pub use html::{render_report, write_report};
