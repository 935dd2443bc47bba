//! `TextSignal`: string in, any non-embedding field out (spec.md §4.D).

use lilac_core::Value;

use crate::signal::SignalMeta;

/// Computes an arbitrary non-embedding field over a batch of strings. Never
/// suspends (spec.md §4.D "May suspend? No").
pub trait TextSignal: SignalMeta {
    fn compute(&self, batch: &[String]) -> Vec<Value>;
}

/// A small always-available `TextSignal`: word and character counts. Used as
/// the executor's default smoke-test signal and in tests (spec.md §9's
/// default-local-implementation convention, mirrored from the reference
/// implementation's always-registered `lang_detection`/statistics signals).
pub struct TextStatisticsSignal;

impl SignalMeta for TextStatisticsSignal {
    fn name(&self) -> &str {
        "text_statistics"
    }

    fn input_type(&self) -> crate::signal::InputType {
        crate::signal::InputType::Text
    }

    fn fields(&self) -> lilac_core::Field {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("num_words".to_string(), lilac_core::Field::leaf(lilac_core::DType::Int32));
        fields.insert("num_chars".to_string(), lilac_core::Field::leaf(lilac_core::DType::Int32));
        lilac_core::Field::struct_(fields)
    }
}

impl TextSignal for TextStatisticsSignal {
    fn compute(&self, batch: &[String]) -> Vec<Value> {
        batch
            .iter()
            .map(|text| {
                let mut fields = std::collections::BTreeMap::new();
                fields.insert(
                    "num_words".to_string(),
                    Value::Int(text.split_whitespace().count() as i64),
                );
                fields.insert("num_chars".to_string(), Value::Int(text.chars().count() as i64));
                Value::Struct(fields)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_statistics_counts_words_and_chars() {
        let signal = TextStatisticsSignal;
        let out = signal.compute(&["hello world".to_string()]);
        let Value::Struct(fields) = &out[0] else {
            panic!("expected struct output");
        };
        assert_eq!(fields.get("num_words"), Some(&Value::Int(2)));
        assert_eq!(fields.get("num_chars"), Some(&Value::Int(11)));
    }
}
