//! Bean and roast catalogs offered to the intake and roasting forms

use rust_decimal::Decimal;
use serde::Serialize;

/// Bean type given to bags of blended-back material from a roast
pub const REPROCESSED_BEAN_TYPE: &str = "بن مُعاد تدويره (توليف)";

/// Label used when a record carries no type at all
pub const UNSPECIFIED_LABEL: &str = "غير محدد";

/// A green bean type the main warehouse receives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BeanType {
    pub name: &'static str,
    /// Prefix of every bag code minted for this type
    pub code: &'static str,
    /// Standard weight of one bag, kg
    pub default_weight_kg: u32,
}

impl BeanType {
    pub fn default_weight(&self) -> Decimal {
        Decimal::from(self.default_weight_kg)
    }
}

pub const BEAN_TYPES: &[BeanType] = &[
    BeanType { name: "اندونيسي", code: "IND", default_weight_kg: 60 },
    BeanType { name: "اندونيسي XL", code: "INDXL", default_weight_kg: 60 },
    BeanType { name: "فتنامي", code: "VIE", default_weight_kg: 60 },
    BeanType { name: "هندي روبستا", code: "INR", default_weight_kg: 60 },
    BeanType { name: "هندي أربيكا", code: "INA", default_weight_kg: 60 },
    BeanType { name: "برازيلي ريو", code: "BRR", default_weight_kg: 60 },
    BeanType { name: "برازيلي سانتوس", code: "BRS", default_weight_kg: 60 },
    BeanType { name: "حبشي", code: "ETH", default_weight_kg: 60 },
    BeanType { name: "يمني", code: "YEM", default_weight_kg: 25 },
    BeanType { name: "كولومبي 35", code: "COL35", default_weight_kg: 35 },
    BeanType { name: "كولومبي 70", code: "COL70", default_weight_kg: 70 },
    BeanType { name: "حبهان كرتونة", code: "HAB-K", default_weight_kg: 5 },
];

/// Roast labels the roasting form offers for output lines
pub const ROAST_TYPES: &[&str] = &[
    "شرقي فاتح",
    "شرقي وسط",
    "شرقي غامق",
    "عميد فاتح",
    "عميد وسط",
    "عميد غامق",
    "سلطان فاتح",
    "سلطان وسط",
    "سلطان غامق",
    "السلطان اكسترا فاتح",
    "كولومبي وسط",
    "كولومبي غامق",
    "برازيلي سانتوس وسط",
    "حبشي وسط",
    "يمني وسط",
];

/// Look up a bean type by its display name
pub fn find_bean_type(name: &str) -> Option<&'static BeanType> {
    let name = name.trim();
    BEAN_TYPES.iter().find(|b| b.name == name)
}
