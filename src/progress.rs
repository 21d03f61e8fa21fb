use indicatif::{ProgressBar, ProgressStyle};

/// Output sink for progress bars, passed to whoever draws them.
#[derive(Debug, Clone, Copy)]
pub struct Reporter {
    visible: bool,
}

impl Reporter {
    pub fn new(visible: bool) -> Self {
        Self { visible }
    }

    pub fn hidden() -> Self {
        Self { visible: false }
    }

    pub fn bar(&self, len: u64, unit: &str) -> ProgressBar {
        if !self.visible {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        let template = format!("[{{elapsed_precise}}] {{bar:30}} {{pos}}/{{len}} {unit}");
        if let Ok(style) = ProgressStyle::with_template(&template) {
            pb.set_style(style);
        }
        pb
    }
}
