//! Assertions.

use crate::model::{Assertion, ComparisonOperator, VariableComparison};

use super::phrase::{View, quote};

pub(super) fn assertion(assertion: &Assertion, view: &View<'_>) -> String {
    let subject = view.target_or_element();
    let expected = || view.input().unwrap_or_else(|| quote(""));
    match assertion {
        Assertion::Exists => format!("Look for {subject} on the page"),
        Assertion::NotExists => format!("Check that {subject} does not exist"),
        Assertion::Equals => format!("Check that {subject} equals {}", expected()),
        Assertion::NotEquals => format!("Check that {subject} does not equal {}", expected()),
        Assertion::Checked => format!("Check that {subject} is checked"),
        Assertion::Selected => format!("Check that {subject} is selected"),
        Assertion::Matches => format!("Check that {subject} matches pattern {}", expected()),
        Assertion::GreaterThan => format!("Check that {subject} is greater than {}", expected()),
        Assertion::LessThan => format!("Check that {subject} is less than {}", expected()),
        Assertion::Variable(comparison) => variable(comparison, view),
    }
}

/// Compare a variable against a literal or a second variable.
fn variable(comparison: &VariableComparison, view: &View<'_>) -> String {
    let subject = view.variable().unwrap_or_else(|| "variable".to_string());
    let operand = comparison
        .operand_variable
        .as_deref()
        .map(|v| format!("${}", crate::model::bare_variable_name(v)))
        .or_else(|| view.value())
        .unwrap_or_else(|| quote(""));
    let operator = match comparison.operator {
        Some(ComparisonOperator::Equals) => "equals",
        Some(ComparisonOperator::NotEquals) => "does not equal",
        Some(ComparisonOperator::LessThan) => "is less than",
        Some(ComparisonOperator::LessThanOrEqual) => "is less than or equal to",
        Some(ComparisonOperator::GreaterThan) => "is greater than",
        Some(ComparisonOperator::GreaterThanOrEqual) => "is greater than or equal to",
        Some(ComparisonOperator::Contains) => "contains",
        Some(ComparisonOperator::Other) | None => {
            return format!("Compare {subject} with {operand}");
        }
    };
    format!("Check that {subject} {operator} {operand}")
}
