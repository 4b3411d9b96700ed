use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static JD_BULLET_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[•\-✔▶]").unwrap());

const MISSING_BULLET: char = '•';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rating {
    NeedsWork,
    Good,
    Excellent,
}

impl Rating {
    pub fn from_percent(percent: u32) -> Self {
        if percent < 50 {
            Rating::NeedsWork
        } else if percent < 80 {
            Rating::Good
        } else {
            Rating::Excellent
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rating::NeedsWork => "Needs Work",
            Rating::Good => "Good",
            Rating::Excellent => "Excellent",
        })
    }
}

/// How many of the job description's bullet points the résumé already covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coverage {
    pub total: usize,
    pub matched: usize,
    pub percent: u32,
    pub missing: Vec<String>,
}

impl Coverage {
    pub fn compute(job_description: &str, suggestions: &str) -> Self {
        let missing = missing_items(suggestions);
        let total = count_bullets(job_description);
        let matched = total.saturating_sub(missing.len());
        let percent = if total > 0 {
            (matched as f64 / total as f64 * 100.0).round() as u32
        } else {
            0
        };
        Self {
            total,
            matched,
            percent,
            missing,
        }
    }

    pub fn rating(&self) -> Rating {
        Rating::from_percent(self.percent)
    }

    pub fn summary(&self) -> String {
        format!(
            "Your resume has {} out of {} ({}%) keywords that appear in the job description.",
            self.matched, self.total, self.percent
        )
    }

    /// Multi-line report: rating, summary, then the missing items.
    pub fn report(&self) -> String {
        let mut out = format!("Keyword match: {}\n{}\n\nMissing:\n", self.rating(), self.summary());
        if self.missing.is_empty() {
            out.push_str("  None, your resume covers all keywords!\n");
        } else {
            for item in &self.missing {
                out.push_str("  - ");
                out.push_str(item);
                out.push('\n');
            }
        }
        out
    }
}

/// Suggestion lines starting with `•`, without the bullet.
pub fn missing_items(suggestions: &str) -> Vec<String> {
    suggestions
        .lines()
        .map(str::trim)
        .filter_map(|l| l.strip_prefix(MISSING_BULLET))
        .map(|l| l.trim().to_string())
        .collect()
}

/// Job description lines that start with a bullet marker (`•`, `-`, `✔`, `▶`).
pub fn count_bullets(job_description: &str) -> usize {
    job_description
        .lines()
        .filter(|l| JD_BULLET_RE.is_match(l.trim()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JD: &str = "About the role\n• Rust\n• Kubernetes\n- SQL\n✔ Testing\nWe offer lunch";

    #[test]
    fn counts_all_bullet_styles() {
        assert_eq!(count_bullets(JD), 4);
        assert_eq!(count_bullets("  ▶ indented\nplain"), 1);
        assert_eq!(count_bullets(""), 0);
    }

    #[test]
    fn missing_items_strip_bullet() {
        let s = "Consider adding the following keywords/points:\n\n• Kubernetes\n\n  •   Testing  ";
        assert_eq!(missing_items(s), vec!["Kubernetes", "Testing"]);
    }

    #[test]
    fn percent_and_rating() {
        let cov = Coverage::compute(JD, "• Kubernetes");
        assert_eq!(cov.total, 4);
        assert_eq!(cov.matched, 3);
        assert_eq!(cov.percent, 75);
        assert_eq!(cov.rating(), Rating::Good);
        assert_eq!(
            cov.summary(),
            "Your resume has 3 out of 4 (75%) keywords that appear in the job description."
        );
    }

    #[test]
    fn rounds_half_up() {
        // 1 of 8 missing: 87.5% -> 88
        let jd = "• a\n• b\n• c\n• d\n• e\n• f\n• g\n• h";
        assert_eq!(Coverage::compute(jd, "• a").percent, 88);
    }

    #[test]
    fn more_missing_than_bullets_floors_at_zero() {
        let cov = Coverage::compute("• one", "• x\n• y\n• z");
        assert_eq!(cov.matched, 0);
        assert_eq!(cov.percent, 0);
        assert_eq!(cov.rating(), Rating::NeedsWork);
    }

    #[test]
    fn no_bullets_is_zero_percent() {
        let cov = Coverage::compute("plain prose only", "✅ Your resume already covers most points");
        assert_eq!(cov.total, 0);
        assert_eq!(cov.percent, 0);
        assert!(cov.missing.is_empty());
        assert!(cov.report().contains("covers all keywords"));
    }

    #[test]
    fn rating_thresholds() {
        assert_eq!(Rating::from_percent(49), Rating::NeedsWork);
        assert_eq!(Rating::from_percent(50), Rating::Good);
        assert_eq!(Rating::from_percent(79), Rating::Good);
        assert_eq!(Rating::from_percent(80), Rating::Excellent);
        assert_eq!(Rating::Excellent.to_string(), "Excellent");
    }
}
