// Rate records
pub mod rates;

// Cross-provider comparison
pub mod rate_comparison;
