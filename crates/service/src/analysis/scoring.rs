//! Health score calculation

use mhc_types::{Category, Finding};

/// Fold findings into one score in `[0, 100]`, rounded to one decimal
///
/// Each category starts at 100 and is multiplied by the discount factor of
/// every finding it holds; the overall score is the weighted sum of the four
/// category scores.
pub fn calculate_health_score(findings: &[Finding]) -> f64 {
	if findings.is_empty() {
		return 100.0;
	}

	let total: f64 = Category::ALL
		.iter()
		.map(|category| category.weight() * category_score(findings, *category))
		.sum();

	round_to_tenth(total).clamp(0.0, 100.0)
}

/// Score of one category; 100 when it has no findings
pub fn category_score(findings: &[Finding], category: Category) -> f64 {
	findings
		.iter()
		.filter(|f| f.category == category)
		.fold(100.0, |score, f| score * f.severity.discount_factor())
}

// Ties round away from zero (97.25 -> 97.3), not to even
fn round_to_tenth(value: f64) -> f64 {
	(value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
	use super::*;
	use mhc_types::Severity;

	fn finding(severity: Severity, category: Category) -> Finding {
		Finding::new("Test", severity, category, "title", "description")
	}

	#[test]
	fn test_empty_findings_score_exactly_100() {
		assert_eq!(calculate_health_score(&[]), 100.0);
	}

	#[test]
	fn test_single_critical_reliability() {
		let findings = vec![finding(Severity::Critical, Category::Reliability)];
		assert_eq!(calculate_health_score(&findings), 86.0);
	}

	#[test]
	fn test_single_performance_warning() {
		let findings = vec![finding(Severity::Warning, Category::Performance)];
		assert_eq!(calculate_health_score(&findings), 95.5);
	}

	#[test]
	fn test_healthy_findings_do_not_discount() {
		let findings: Vec<Finding> = Category::ALL
			.iter()
			.map(|c| finding(Severity::Healthy, *c))
			.collect();
		assert_eq!(calculate_health_score(&findings), 100.0);
	}

	#[test]
	fn test_many_criticals_never_negative() {
		let findings: Vec<Finding> = (0..10)
			.map(|_| finding(Severity::Critical, Category::Reliability))
			.collect();
		let score = calculate_health_score(&findings);
		assert!(score >= 0.0);
		assert!(score < 70.0);
	}

	#[test]
	fn test_score_bounded_for_mixed_findings() {
		let severities = [
			Severity::Critical,
			Severity::Warning,
			Severity::Informational,
			Severity::Healthy,
		];
		let findings: Vec<Finding> = (0..40)
			.map(|i| finding(severities[i % 4], Category::ALL[(i / 4) % 4]))
			.collect();
		let score = calculate_health_score(&findings);
		assert!((0.0..=100.0).contains(&score));
	}

	#[test]
	fn test_discounts_commute() {
		let a = vec![
			finding(Severity::Critical, Category::Security),
			finding(Severity::Informational, Category::Security),
			finding(Severity::Warning, Category::Security),
		];
		let mut b = a.clone();
		b.reverse();
		assert_eq!(
			category_score(&a, Category::Security),
			category_score(&b, Category::Security)
		);
		// 100 * 0.60 * 0.95 * 0.85
		assert!((category_score(&a, Category::Security) - 48.45).abs() < 1e-9);
	}

	#[test]
	fn test_round_to_tenth_ties_away_from_zero() {
		assert_eq!(round_to_tenth(97.25), 97.3);
		assert_eq!(round_to_tenth(0.25), 0.3);
		assert_eq!(round_to_tenth(84.04), 84.0);
	}
}
