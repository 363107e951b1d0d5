// src/process/derive.rs
use rayon::prelude::*;

use super::normalize::CanonicalRecord;

/// P/L × P/VP, present only when both inputs are and the product is finite.
pub fn graham_score(price_earnings: Option<f64>, price_book: Option<f64>) -> Option<f64> {
    let pe = price_earnings.filter(|v| v.is_finite())?;
    let pb = price_book.filter(|v| v.is_finite())?;
    Some(pe * pb).filter(|v| v.is_finite())
}

pub fn with_graham_score(mut record: CanonicalRecord) -> CanonicalRecord {
    record.graham_score = graham_score(record.price_earnings, record.price_book);
    record
}

/// Apply [`with_graham_score`] to each record, keeping order.
pub fn derive_all(records: Vec<CanonicalRecord>) -> Vec<CanonicalRecord> {
    records.into_par_iter().map(with_graham_score).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multiplies_earnings_and_book_multiples() {
        let score = graham_score(Some(5.2), Some(0.9)).unwrap();
        assert!((score - 4.68).abs() < 1e-9);
    }

    #[test]
    fn missing_input_gives_missing_score() {
        assert_eq!(graham_score(None, Some(0.9)), None);
        assert_eq!(graham_score(Some(5.2), None), None);
        assert_eq!(graham_score(Some(f64::MAX), Some(10.0)), None);
    }
}
