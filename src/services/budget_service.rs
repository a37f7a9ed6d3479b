use crate::models::generate::BudgetSummary;

// Fixed split of the requested total. Each category is rounded on its own,
// so the categories can drift from the total by a few units.
pub const TRAVEL_RATIO: f64 = 0.35;
pub const ACCOMMODATION_RATIO: f64 = 0.30;
pub const ACTIVITIES_RATIO: f64 = 0.25;
pub const FOOD_RATIO: f64 = 0.10;

pub struct BudgetAllocator;

impl BudgetAllocator {
    /// Allocate the requested total across the four categories. There is no
    /// positivity guard: a zero or negative total produces zero/negative
    /// allocations without error.
    pub fn allocate(total: f64) -> BudgetSummary {
        BudgetSummary {
            travel: (total * TRAVEL_RATIO).round() as i64,
            accommodation: (total * ACCOMMODATION_RATIO).round() as i64,
            activities: (total * ACTIVITIES_RATIO).round() as i64,
            food: (total * FOOD_RATIO).round() as i64,
            total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        let summary = BudgetAllocator::allocate(50000.0);
        assert_eq!(summary.travel, 17500);
        assert_eq!(summary.accommodation, 15000);
        assert_eq!(summary.activities, 12500);
        assert_eq!(summary.food, 5000);
        assert_eq!(summary.total, 50000.0);
    }

    #[test]
    fn test_rounding_slack_stays_within_bounds() {
        // Each category rounds independently, so the sum may drift from the
        // total, but never by more than half a unit per category.
        for total in [1.0, 99.0, 999.0, 12345.0, 99999.0, 1234567.0] {
            let summary = BudgetAllocator::allocate(total);
            let sum = summary.travel + summary.accommodation + summary.activities + summary.food;
            assert!(
                (sum as f64 - total).abs() <= 4.0,
                "sum {} drifted too far from total {}",
                sum,
                total
            );
        }
    }

    #[test]
    fn test_allocations_non_negative_for_non_negative_totals() {
        for total in [0.0, 1.0, 3.0, 10.0, 50000.0] {
            let summary = BudgetAllocator::allocate(total);
            assert!(summary.travel >= 0);
            assert!(summary.accommodation >= 0);
            assert!(summary.activities >= 0);
            assert!(summary.food >= 0);
        }
    }

    #[test]
    fn test_zero_and_negative_totals_do_not_error() {
        let zero = BudgetAllocator::allocate(0.0);
        assert_eq!(zero.travel + zero.accommodation + zero.activities + zero.food, 0);

        let negative = BudgetAllocator::allocate(-1000.0);
        assert_eq!(negative.travel, -350);
        assert_eq!(negative.food, -100);
    }
}
