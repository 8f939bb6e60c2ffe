//! Search query construction from product attributes.

use crate::types::ProductDescriptor;

/// Terms appended to every query to bias results toward clean product shots.
pub const HINT_SUFFIX: &str = "product image front side top angle box";

/// Build the image search query for a product.
///
/// Fields are taken in priority order: brand, model (falling back to name), color,
/// size, category. Blank fields are skipped.
pub fn build_query(product: &ProductDescriptor) -> String {
    let model_or_name = non_blank(product.model.as_deref()).or(non_blank(product.name.as_deref()));

    let terms: Vec<&str> = [
        non_blank(product.brand.as_deref()),
        model_or_name,
        non_blank(product.color.as_deref()),
        non_blank(product.size.as_deref()),
        non_blank(product.category.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let mut query = collapse_whitespace(&terms.join(" "));
    if !query.is_empty() {
        query.push(' ');
    }
    query.push_str(HINT_SUFFIX);
    query.trim().to_string()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// Field values can carry internal runs of whitespace ("Acme   Corp").
fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(fields: &[(&str, &str)]) -> ProductDescriptor {
        let mut p = ProductDescriptor::default();
        for (key, value) in fields {
            let value = Some(value.to_string());
            match *key {
                "brand" => p.brand = value,
                "model" => p.model = value,
                "color" => p.color = value,
                "size" => p.size = value,
                "category" => p.category = value,
                "name" => p.name = value,
                _ => panic!("unknown field {}", key),
            }
        }
        p
    }

    #[test]
    fn test_empty_descriptor_is_hint_suffix() {
        assert_eq!(build_query(&ProductDescriptor::default()), HINT_SUFFIX);
        assert_eq!(
            build_query(&product(&[("brand", "  "), ("name", ""), ("color", "\t")])),
            HINT_SUFFIX
        );
    }

    #[test]
    fn test_priority_order() {
        let p = product(&[
            ("category", "Sunglasses"),
            ("size", "M"),
            ("color", "Black"),
            ("model", "X100"),
            ("brand", "Acme"),
        ]);
        assert_eq!(
            build_query(&p),
            format!("Acme X100 Black M Sunglasses {}", HINT_SUFFIX)
        );
    }

    #[test]
    fn test_model_preferred_over_name() {
        let p = product(&[("model", "X100"), ("name", "Aviator Classic")]);
        assert_eq!(build_query(&p), format!("X100 {}", HINT_SUFFIX));

        let p = product(&[("model", " "), ("name", "Aviator Classic")]);
        assert_eq!(build_query(&p), format!("Aviator Classic {}", HINT_SUFFIX));
    }

    #[test]
    fn test_no_placeholder_tokens_or_double_spaces() {
        let p = product(&[("brand", " Acme  Corp "), ("color", "  "), ("size", "XL ")]);
        let query = build_query(&p);
        assert!(!query.contains("  "));
        assert!(!query.contains("undefined"));
        assert!(!query.contains("null"));
        assert_eq!(query, format!("Acme Corp XL {}", HINT_SUFFIX));
    }

    #[test]
    fn test_deterministic() {
        let p = product(&[("brand", "Acme"), ("category", "Hats")]);
        assert_eq!(build_query(&p), build_query(&p.clone()));
    }
}
