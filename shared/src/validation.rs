//! Validation rules for ledger operations
//!
//! Every check here runs against caller input and an already-fetched
//! snapshot; nothing in this module performs I/O.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::models::BatchLine;
use crate::types::format_kg;

/// Decimal places a weight may carry; entry forms step by 0.01 kg
pub const WEIGHT_DECIMALS: u32 = 2;

/// Most bags one intake may register
pub const MAX_INTAKE_BAGS: i64 = 1000;

/// A rule an operation's input broke. Nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerViolation {
    #[error("{field} is required{}", line_suffix(.line))]
    MissingField {
        field: &'static str,
        line: Option<usize>,
    },

    #[error("{field} must be positive{}", line_suffix(.line))]
    NonPositive {
        field: &'static str,
        line: Option<usize>,
    },

    #[error("{field} allows at most {} decimal places{}", WEIGHT_DECIMALS, line_suffix(.line))]
    TooPrecise {
        field: &'static str,
        line: Option<usize>,
    },

    #[error("{field} must be at most {max}")]
    AboveLimit { field: &'static str, max: i64 },

    #[error("Unknown bean type: {0}")]
    UnknownBeanType(String),

    #[error(
        "Roasted output {output_kg} kg plus reprocessed {reprocessed_kg} kg exceeds green input {input_kg} kg"
    )]
    OutputExceedsInput {
        input_kg: Decimal,
        output_kg: Decimal,
        reprocessed_kg: Decimal,
    },

    #[error("Cannot move {requested} bags of {bean_type}: only {available} available")]
    InsufficientBags {
        bean_type: String,
        requested: usize,
        available: usize,
    },

    #[error("Cannot deduct {requested_kg} kg of {bean_type}: only {available_kg} kg at the roastery")]
    InsufficientWeight {
        bean_type: String,
        requested_kg: Decimal,
        available_kg: Decimal,
    },

    #[error("Cannot dispatch {requested_kg} kg of {roast_type}: only {available_kg} kg available")]
    AllocationExceeded {
        roast_type: String,
        requested_kg: Decimal,
        available_kg: Decimal,
    },

    #[error("No open output line {roast_type} on this batch")]
    UnknownOutputLine { roast_type: String },
}

fn line_suffix(line: &Option<usize>) -> String {
    line.map(|l| format!(" (line {})", l + 1)).unwrap_or_default()
}

impl LedgerViolation {
    /// Name of the offending input field
    pub fn field(&self) -> &'static str {
        match self {
            LedgerViolation::MissingField { field, .. } => field,
            LedgerViolation::NonPositive { field, .. } => field,
            LedgerViolation::TooPrecise { field, .. } => field,
            LedgerViolation::AboveLimit { field, .. } => field,
            LedgerViolation::UnknownBeanType(_) => "bean_type",
            LedgerViolation::OutputExceedsInput { .. } => "outputs",
            LedgerViolation::InsufficientBags { .. } => "count",
            LedgerViolation::InsufficientWeight { .. } => "inputs",
            LedgerViolation::AllocationExceeded { .. } => "weight_kg",
            LedgerViolation::UnknownOutputLine { .. } => "roast_type",
        }
    }

    /// True when the request was well-formed but stock does not cover it
    pub fn is_shortfall(&self) -> bool {
        matches!(
            self,
            LedgerViolation::InsufficientBags { .. }
                | LedgerViolation::InsufficientWeight { .. }
                | LedgerViolation::AllocationExceeded { .. }
        )
    }

    /// Arabic message for the operator
    pub fn message_ar(&self) -> String {
        match self {
            LedgerViolation::MissingField { field, line } => {
                format!("أكمل البيانات: الحقل {} مطلوب{}", field, line_suffix_ar(*line))
            }
            LedgerViolation::NonPositive { field, line } => {
                format!("أدخل قيمة صحيحة للحقل {}{}", field, line_suffix_ar(*line))
            }
            LedgerViolation::TooPrecise { field, line } => format!(
                "الحقل {} يقبل منزلتين عشريتين كحد أقصى{}",
                field,
                line_suffix_ar(*line)
            ),
            LedgerViolation::AboveLimit { field, max } => {
                format!("الحد الأقصى للحقل {} هو {}", field, max)
            }
            LedgerViolation::UnknownBeanType(name) => format!("نوع البن غير معروف: {}", name),
            LedgerViolation::OutputExceedsInput { .. } => {
                "لا يمكن أن يكون إجمالي الناتج المحمص والتوليف أكبر من البن الأخضر.".to_string()
            }
            LedgerViolation::InsufficientBags {
                bean_type,
                requested,
                available,
            } => format!(
                "لا يمكنك نقل {} شوال من نوع {} — المتاح {} فقط",
                requested, bean_type, available
            ),
            LedgerViolation::InsufficientWeight {
                bean_type,
                requested_kg,
                available_kg,
            } => format!(
                "رصيد {} في المحمصة {} كجم لا يكفي لخصم {} كجم",
                bean_type,
                format_kg(*available_kg),
                format_kg(*requested_kg)
            ),
            LedgerViolation::AllocationExceeded {
                roast_type,
                requested_kg,
                available_kg,
            } => format!(
                "لا يمكن نقل {} كجم — المتاح من {} فقط {} كجم",
                requested_kg,
                roast_type,
                format_kg(*available_kg)
            ),
            LedgerViolation::UnknownOutputLine { roast_type } => {
                format!("لا يوجد رصيد متاح من {} في هذه الدفعة", roast_type)
            }
        }
    }
}

fn line_suffix_ar(line: Option<usize>) -> String {
    line.map(|l| format!(" (السطر {})", l + 1)).unwrap_or_default()
}

/// Weight totals of a roast, waste included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RoastTotals {
    pub input_kg: Decimal,
    pub output_kg: Decimal,
    pub reprocessed_kg: Decimal,
    pub waste_kg: Decimal,
}

impl RoastTotals {
    pub fn new(input_kg: Decimal, output_kg: Decimal, reprocessed_kg: Decimal) -> Self {
        Self {
            input_kg,
            output_kg,
            reprocessed_kg,
            waste_kg: input_kg - output_kg - reprocessed_kg,
        }
    }

    pub fn is_high_waste(&self, threshold_kg: Decimal) -> bool {
        self.waste_kg > threshold_kg
    }
}

fn check_weight(weight_kg: Decimal, field: &'static str, line: Option<usize>) -> Result<(), LedgerViolation> {
    if weight_kg <= Decimal::ZERO {
        return Err(LedgerViolation::NonPositive { field, line });
    }
    if weight_kg.normalize().scale() > WEIGHT_DECIMALS {
        return Err(LedgerViolation::TooPrecise { field, line });
    }
    Ok(())
}

/// A weight entered on a form: positive, in steps of 0.01 kg
pub fn validate_weight(field: &'static str, weight_kg: Decimal) -> Result<(), LedgerViolation> {
    check_weight(weight_kg, field, None)
}

/// Validate a bulk intake of `count` bags weighing `weight_kg` each,
/// returning the bag count
pub fn validate_intake(count: i64, weight_kg: Decimal) -> Result<usize, LedgerViolation> {
    if count <= 0 {
        return Err(LedgerViolation::NonPositive {
            field: "count",
            line: None,
        });
    }
    if count > MAX_INTAKE_BAGS {
        return Err(LedgerViolation::AboveLimit {
            field: "count",
            max: MAX_INTAKE_BAGS,
        });
    }
    validate_weight("weight_kg", weight_kg)?;
    usize::try_from(count).map_err(|_| LedgerViolation::AboveLimit {
        field: "count",
        max: MAX_INTAKE_BAGS,
    })
}

/// Validate moving `requested` bags when `available` are at the main warehouse
pub fn validate_transfer_count(
    bean_type: &str,
    requested: i64,
    available: usize,
) -> Result<usize, LedgerViolation> {
    if requested <= 0 {
        return Err(LedgerViolation::NonPositive {
            field: "count",
            line: None,
        });
    }
    let requested = usize::try_from(requested).unwrap_or(usize::MAX);
    if requested > available {
        return Err(LedgerViolation::InsufficientBags {
            bean_type: bean_type.to_string(),
            requested,
            available,
        });
    }
    Ok(requested)
}

fn validate_lines(lines: &[BatchLine], field: &'static str) -> Result<Decimal, LedgerViolation> {
    let mut total = Decimal::ZERO;
    for (i, line) in lines.iter().enumerate() {
        if line.label.trim().is_empty() {
            return Err(LedgerViolation::MissingField {
                field,
                line: Some(i),
            });
        }
        check_weight(line.weight_kg, field, Some(i))?;
        total += line.weight_kg;
    }
    Ok(total)
}

/// Validate a roast and compute its totals.
///
/// Checks run in a fixed order: input lines, output lines, the reprocessed
/// weight when reprocessing is flagged (`Some`), then mass balance.
pub fn validate_roast(
    inputs: &[BatchLine],
    outputs: &[BatchLine],
    reprocessed_kg: Option<Decimal>,
) -> Result<RoastTotals, LedgerViolation> {
    if inputs.is_empty() {
        return Err(LedgerViolation::MissingField {
            field: "inputs",
            line: None,
        });
    }
    let input_kg = validate_lines(inputs, "inputs")?;

    if outputs.is_empty() {
        return Err(LedgerViolation::MissingField {
            field: "outputs",
            line: None,
        });
    }
    let output_kg = validate_lines(outputs, "outputs")?;

    let reprocessed_kg = match reprocessed_kg {
        Some(w) => {
            validate_weight("reprocessed_weight_kg", w)?;
            w
        }
        None => Decimal::ZERO,
    };

    if output_kg + reprocessed_kg > input_kg {
        return Err(LedgerViolation::OutputExceedsInput {
            input_kg,
            output_kg,
            reprocessed_kg,
        });
    }

    Ok(RoastTotals::new(input_kg, output_kg, reprocessed_kg))
}

/// Validate a branch dispatch against the line's exact remaining balance
pub fn validate_dispatch(
    roast_type: &str,
    requested_kg: Decimal,
    available_kg: Decimal,
) -> Result<(), LedgerViolation> {
    validate_weight("weight_kg", requested_kg)?;
    if requested_kg > available_kg {
        return Err(LedgerViolation::AllocationExceeded {
            roast_type: roast_type.to_string(),
            requested_kg,
            available_kg,
        });
    }
    Ok(())
}
