use crate::domain::{HopstatError, Report};

pub trait Renderer: Send + Sync {
    fn render(&self, report: &Report) -> Result<String, HopstatError>;
}
