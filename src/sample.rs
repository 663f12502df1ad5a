// src/sample.rs
//
// One TDS reading and its contamination verdict.

/// A single TDS reading in ppm. Immutable once decoded.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct Sample(f64);

impl Sample {
    /// Placeholder used to pad the rolling buffer.
    pub const ZERO: Sample = Sample(0.0);

    pub fn new(ppm: f64) -> Self {
        Self(ppm)
    }

    pub fn ppm(self) -> f64 {
        self.0
    }
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ppm", self.0)
    }
}

// ---------------- Classification ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Normal,
    Alert,
}

/// Derived per sample; never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub contaminated: bool,
    pub threshold: f64,
}

impl Verdict {
    pub fn severity(&self) -> Severity {
        if self.contaminated {
            Severity::Alert
        } else {
            Severity::Normal
        }
    }

    pub fn headline(&self) -> String {
        if self.contaminated {
            format!("WATER CONTAMINATED! (threshold {} ppm)", self.threshold)
        } else {
            "Water safe. TDS level acceptable.".to_string()
        }
    }

    /// Contamination column of the log file.
    pub fn flag(&self) -> &'static str {
        if self.contaminated {
            "SI"
        } else {
            "NO"
        }
    }
}

/// At-threshold counts as contaminated.
pub fn classify(sample: Sample, threshold: f64) -> Verdict {
    Verdict {
        contaminated: sample.ppm() >= threshold,
        threshold,
    }
}
