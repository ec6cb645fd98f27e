use super::row::{Field, FieldSet, Row};

/// The required fields of `row` that are empty. A zero amount counts as empty.
pub fn invalid_fields(row: &Row) -> FieldSet {
    Field::ALL
        .into_iter()
        .filter(|field| field.is_required() && !has_value(row, *field))
        .collect()
}

pub fn is_valid(row: &Row) -> bool {
    invalid_fields(row).is_empty()
}

fn has_value(row: &Row, field: Field) -> bool {
    match field {
        Field::Date => row.date.is_some(),
        Field::Amount => row.amount.is_some_and(|amount| amount != 0.0),
        Field::Account => row.account.is_some(),
        Field::Budget => row.budget.is_some(),
        Field::Category => row.category.is_some(),
    }
}
