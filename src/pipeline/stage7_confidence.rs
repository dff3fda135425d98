use serde::Serialize;

pub const LOW_CONFIDENCE_THRESHOLD: u8 = 30;
pub const LOW_CONFIDENCE_NOTE: &str = "Low confidence: answer may be incomplete or uncertain";
pub const REASON_SEPARATOR: &str = " • ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Confidence {
    pub score: u8,
    pub explanation: String,
}

impl Confidence {
    pub fn is_low(&self) -> bool {
        self.score < LOW_CONFIDENCE_THRESHOLD
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceInputs<'a> {
    pub retrieved: usize,
    pub has_rows: bool,
    pub has_samples: bool,
    pub has_metric: bool,
    pub question: &'a str,
}

pub fn score_confidence(inputs: &ConfidenceInputs<'_>) -> Confidence {
    let mut score: u32 = 0;
    let mut reasons: Vec<String> = Vec::new();

    match inputs.retrieved {
        n if n >= 3 => {
            score += 35;
            reasons.push(format!("Found {n} relevant documents"));
        }
        n if n >= 1 => {
            score += 20;
            reasons.push(format!("Found {n} document(s)"));
        }
        _ => {
            score += 5;
            reasons.push("No specific documents retrieved".to_string());
        }
    }

    if inputs.has_rows {
        score += 30;
        reasons.push("Tabular data available".to_string());
    } else if inputs.has_samples {
        score += 15;
        reasons.push("Sample data available".to_string());
    }

    if inputs.has_metric {
        score += 20;
        reasons.push("Specific metric requested".to_string());
    } else if inputs.retrieved > 0 {
        score += 15;
        reasons.push("General context available".to_string());
    }

    let words = inputs.question.split_whitespace().count();
    if (3..=40).contains(&words) {
        score += 15;
        reasons.push("Clear question".to_string());
    } else {
        score += 8;
    }

    Confidence {
        score: score.min(100) as u8,
        explanation: reasons.join(REASON_SEPARATOR),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage7_confidence.rs"]
mod tests;
