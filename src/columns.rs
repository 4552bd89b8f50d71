//! Column names used across the survey export

pub const GENDER: &str = "gender";
pub const AGE: &str = "age";
pub const MONTHLY_INCOME: &str = "monthly_income";
pub const OCCUPATION: &str = "occupation";

/// Fields every retained respondent must have.
pub const REQUIRED: [&str; 3] = [GENDER, AGE, MONTHLY_INCOME];

pub const PREFERRED_PRICE_RANGE: &str = "preferred_price_range";

/// Header variants seen in exports, mapped to the canonical name.
pub const ALIASES: [(&str, &str); 1] = [("preferred_price_range ", PREFERRED_PRICE_RANGE)];

// Derived by the loader.
pub const INCOME_MID: &str = "income_mid";
pub const PRICE_MIDPOINT: &str = "price_midpoint";
pub const AGE_GROUP: &str = "age_group";
pub const INCOME_GROUP: &str = "income_group";

/// Numeric price columns that share the `price_` prefix but are not Likert items.
pub const DERIVED_PRICE: [&str; 4] = [PRICE_MIDPOINT, "price_min", "price_max", "price_mid"];

// Persona inputs.
pub const FACTOR_DURABILITY: &str = "factor_durability";
pub const FACTOR_WARRANTY: &str = "factor_warranty";
pub const FACTOR_BRAND_TRUST: &str = "factor_brand_trust";
pub const PRICE_VALUE_FOR_QUALITY: &str = "price_value_for_quality";
pub const PRICE_WITHIN_BUDGET: &str = "price_within_budget";
pub const PRICE_IMAGE_BOOST: &str = "price_image_boost";
pub const PROMO_DISCOUNT: &str = "promo_discount";
pub const CHANNEL_FAST_SHIPPING: &str = "channel_fast_shipping";
pub const CHANNEL_EASY_TO_FIND: &str = "channel_easy_to_find";

// Optional analyses.
pub const LUGGAGE_FREQUENCY: &str = "luggage_frequency";
pub const MOST_USED_PLATFORM: &str = "most_used_platform";
pub const PURCHASE_CHANNELS: &str = "purchase_channels";
pub const PREFERRED_STYLES: &str = "preferred_styles";
pub const USED_BAG_TYPES: &str = "used_bag_types";
pub const LUGGAGE_SIZE_SHORT_TRIP: &str = "luggage_size_short_trip";
pub const PREFERRED_PRESENTER: &str = "preferred_presenter";
pub const KNOW_BRAND: &str = "know_tpartner";
pub const BRAND_FIRST_CHANNEL: &str = "tpartner_first_channel";
pub const BRAND_POSITIONING: &str = "tpartner_positioning";
pub const FIRST_IMPRESSION: &str = "first_impression";
pub const CONSIDERED_BRAND: &str = "considered_tpartner";
pub const REASON_NOT_CHOSEN: &str = "reason_not_chosen";

/// Answers that mean "no answer" in free-text columns.
pub const PLACEHOLDERS: [&str; 2] = ["", "-"];

/// Likert item families, identified by column-name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LikertFamily {
    Factor,
    Price,
    Channel,
    Promo,
}

impl LikertFamily {
    pub const ALL: [LikertFamily; 4] = [
        LikertFamily::Factor,
        LikertFamily::Price,
        LikertFamily::Channel,
        LikertFamily::Promo,
    ];

    pub fn prefix(self) -> &'static str {
        match self {
            LikertFamily::Factor => "factor_",
            LikertFamily::Price => "price_",
            LikertFamily::Channel => "channel_",
            LikertFamily::Promo => "promo_",
        }
    }

    /// Whether `column` is an item of this family.
    pub fn contains(self, column: &str) -> bool {
        column.starts_with(self.prefix()) && !DERIVED_PRICE.contains(&column)
    }

    /// The family `column` belongs to, if it is a Likert item at all.
    pub fn of(column: &str) -> Option<LikertFamily> {
        Self::ALL.into_iter().find(|family| family.contains(column))
    }
}

/// Human-readable label for a Likert column: `factor_brand_trust` → `Brand Trust`.
pub fn display_name(column: &str) -> String {
    let stem = LikertFamily::of(column)
        .and_then(|family| column.strip_prefix(family.prefix()))
        .unwrap_or(column);
    stem.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Whether a free-text answer is a "no answer" placeholder.
pub fn is_placeholder(value: &str) -> bool {
    PLACEHOLDERS.contains(&value.trim())
}
