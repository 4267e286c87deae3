//! Deterministic mapping of analyzer output into relational rows.
//!
//! Parsing is best-effort enrichment, never lossy: `raw_text` always
//! carries the analyzer's line verbatim, and a line that does not fit
//! the quantity-unit-item shape becomes the item wholesale.

use rsave_models::{AnalyzedRecipe, Ingredient, Instruction, RecipeId};

/// Units the parser recognizes after a leading quantity.
const UNIT_VOCAB: &[&str] = &[
    "cup",
    "cups",
    "tbsp",
    "tablespoon",
    "tablespoons",
    "tsp",
    "teaspoon",
    "teaspoons",
    "oz",
    "ounce",
    "ounces",
    "lb",
    "lbs",
    "pound",
    "pounds",
    "g",
    "gram",
    "grams",
    "kg",
    "kilogram",
    "kilograms",
    "ml",
    "milliliter",
    "milliliters",
    "l",
    "liter",
    "liters",
    "litre",
    "litres",
];

/// Map an analyzed recipe into ingredient and instruction rows with
/// contiguous `order_index` (0-based) and `step_number` (1-based).
pub fn map_recipe(
    recipe_id: RecipeId,
    analyzed: &AnalyzedRecipe,
) -> (Vec<Ingredient>, Vec<Instruction>) {
    let ingredients = analyzed
        .ingredients
        .iter()
        .filter(|line| !line.trim().is_empty())
        .enumerate()
        .map(|(index, line)| {
            let parsed = parse_ingredient_line(line);
            Ingredient {
                recipe_id,
                order_index: index as u32,
                quantity: parsed.quantity,
                unit: parsed.unit,
                item: parsed.item,
                raw_text: line.clone(),
            }
        })
        .collect();

    let instructions = analyzed
        .instructions
        .iter()
        .map(|text| text.trim())
        .filter(|text| !text.is_empty())
        .enumerate()
        .map(|(index, text)| Instruction {
            recipe_id,
            step_number: index as u32 + 1,
            text: text.to_string(),
        })
        .collect();

    (ingredients, instructions)
}

#[derive(Debug, PartialEq)]
struct ParsedLine {
    quantity: Option<f64>,
    unit: Option<String>,
    item: String,
}

/// Split a raw ingredient line into quantity, unit and item.
fn parse_ingredient_line(line: &str) -> ParsedLine {
    let fallback = || ParsedLine {
        quantity: None,
        unit: None,
        item: line.trim().to_string(),
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((quantity, consumed)) = parse_quantity(&tokens) else {
        return fallback();
    };

    let mut index = consumed;
    let unit = tokens.get(index).and_then(|token| {
        let cleaned = token.trim_matches(|c| c == '.' || c == ',');
        UNIT_VOCAB
            .contains(&cleaned.to_ascii_lowercase().as_str())
            .then(|| cleaned.to_string())
    });
    if unit.is_some() {
        index += 1;
        // "2 cups of flour" reads better as item "flour".
        if tokens.get(index).is_some_and(|t| t.eq_ignore_ascii_case("of")) {
            index += 1;
        }
    }

    let item = tokens[index..].join(" ");
    if item.is_empty() {
        return fallback();
    }

    ParsedLine {
        quantity: Some(quantity),
        unit,
        item,
    }
}

/// Parse a leading quantity from the token stream.
///
/// Handles integers, decimals, simple fractions ("1/2") and mixed
/// numbers ("1 1/2"). Returns the value and how many tokens it ate.
fn parse_quantity(tokens: &[&str]) -> Option<(f64, usize)> {
    let first = *tokens.first()?;

    if let Some(fraction) = parse_fraction(first) {
        return Some((fraction, 1));
    }

    if let Ok(whole) = first.parse::<u32>() {
        if let Some(fraction) = tokens.get(1).and_then(|t| parse_fraction(t)) {
            return Some((whole as f64 + fraction, 2));
        }
        return Some((whole as f64, 1));
    }

    first
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
        .map(|v| (v, 1))
}

fn parse_fraction(token: &str) -> Option<f64> {
    let (numerator, denominator) = token.split_once('/')?;
    let numerator: u32 = numerator.parse().ok()?;
    let denominator: u32 = denominator.parse().ok()?;
    if denominator == 0 {
        return None;
    }
    Some(numerator as f64 / denominator as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(line: &str) -> ParsedLine {
        parse_ingredient_line(line)
    }

    #[test]
    fn quantity_unit_item() {
        assert_eq!(
            parsed("2 cups flour"),
            ParsedLine {
                quantity: Some(2.0),
                unit: Some("cups".to_string()),
                item: "flour".to_string(),
            }
        );
    }

    #[test]
    fn simple_fraction() {
        assert_eq!(
            parsed("1/2 tsp salt"),
            ParsedLine {
                quantity: Some(0.5),
                unit: Some("tsp".to_string()),
                item: "salt".to_string(),
            }
        );
    }

    #[test]
    fn mixed_number() {
        assert_eq!(
            parsed("1 1/2 cups sugar"),
            ParsedLine {
                quantity: Some(1.5),
                unit: Some("cups".to_string()),
                item: "sugar".to_string(),
            }
        );
    }

    #[test]
    fn decimal_quantity() {
        assert_eq!(
            parsed("0.5 l milk"),
            ParsedLine {
                quantity: Some(0.5),
                unit: Some("l".to_string()),
                item: "milk".to_string(),
            }
        );
    }

    #[test]
    fn quantity_without_unit() {
        assert_eq!(
            parsed("3 eggs"),
            ParsedLine {
                quantity: Some(3.0),
                unit: None,
                item: "eggs".to_string(),
            }
        );
    }

    #[test]
    fn of_after_unit_is_dropped() {
        assert_eq!(
            parsed("2 cups of flour"),
            ParsedLine {
                quantity: Some(2.0),
                unit: Some("cups".to_string()),
                item: "flour".to_string(),
            }
        );
    }

    #[test]
    fn unparseable_line_becomes_item() {
        assert_eq!(
            parsed("a pinch of sugar"),
            ParsedLine {
                quantity: None,
                unit: None,
                item: "a pinch of sugar".to_string(),
            }
        );
        assert_eq!(
            parsed("salt to taste"),
            ParsedLine {
                quantity: None,
                unit: None,
                item: "salt to taste".to_string(),
            }
        );
    }

    #[test]
    fn bare_quantity_falls_back_to_whole_line() {
        // "2 cups" with no item is not a usable parse.
        assert_eq!(
            parsed("2 cups"),
            ParsedLine {
                quantity: None,
                unit: None,
                item: "2 cups".to_string(),
            }
        );
    }

    #[test]
    fn zero_denominator_is_not_a_fraction() {
        assert_eq!(
            parsed("1/0 cups flour"),
            ParsedLine {
                quantity: None,
                unit: None,
                item: "1/0 cups flour".to_string(),
            }
        );
    }

    #[test]
    fn raw_text_is_verbatim_regardless_of_parse() {
        let analyzed = AnalyzedRecipe {
            ingredients: vec![
                "2 cups flour".to_string(),
                "  a pinch of sugar ".to_string(),
            ],
            instructions: vec!["Mix".to_string()],
            ..Default::default()
        };
        let (ingredients, _) = map_recipe(RecipeId::new(), &analyzed);
        assert_eq!(ingredients[0].raw_text, "2 cups flour");
        assert_eq!(ingredients[1].raw_text, "  a pinch of sugar ");
    }

    #[test]
    fn indices_are_contiguous_and_skip_blank_lines() {
        let analyzed = AnalyzedRecipe {
            ingredients: vec![
                "1 cup rice".to_string(),
                "   ".to_string(),
                "2 tbsp soy sauce".to_string(),
            ],
            instructions: vec![
                "Rinse the rice".to_string(),
                "".to_string(),
                "Cook it".to_string(),
                "Serve".to_string(),
            ],
            ..Default::default()
        };
        let id = RecipeId::new();
        let (ingredients, instructions) = map_recipe(id, &analyzed);

        let indices: Vec<u32> = ingredients.iter().map(|i| i.order_index).collect();
        assert_eq!(indices, vec![0, 1]);

        let steps: Vec<u32> = instructions.iter().map(|i| i.step_number).collect();
        assert_eq!(steps, vec![1, 2, 3]);
        assert!(ingredients.iter().all(|i| i.recipe_id == id));
    }

    #[test]
    fn same_input_same_output() {
        let analyzed = AnalyzedRecipe {
            ingredients: vec!["1 1/2 cups sugar".to_string(), "3 eggs".to_string()],
            instructions: vec!["Whisk".to_string()],
            ..Default::default()
        };
        let id = RecipeId::new();
        assert_eq!(map_recipe(id, &analyzed), map_recipe(id, &analyzed));
    }
}
