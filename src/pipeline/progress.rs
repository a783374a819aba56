use std::fmt;

/// Progress of a generation run, reported before each size is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the current size.
    pub step: usize,
    pub total: usize,
    pub size: u32,
}

impl Progress {
    /// Completed fraction in `0.0..=1.0`, counting the current step.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.step as f64 / self.total as f64
    }

    pub fn percent(&self) -> f64 {
        self.fraction() * 100.0
    }

    pub fn label(&self) -> String {
        format!("Generating {0}×{0} icon...", self.size)
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.step, self.total, self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fraction_and_label() {
        let p = Progress {
            step: 1,
            total: 4,
            size: 128,
        };
        assert_eq!(p.fraction(), 0.25);
        assert_eq!(p.percent(), 25.0);
        assert_eq!(p.label(), "Generating 128×128 icon...");
        assert_eq!(p.to_string(), "[1/4] Generating 128×128 icon...");
    }
}
