//! Page text sections and header navigation.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Key holding parameter substitutions inside a section object.
const PARAMS_KEY: &str = "params";

/// One page section (`head`, `home`, `auth`, ...) as ordered text slots.
///
/// The backend sends numbered keys (`head1`, `head2`, ... `head10`). Slots
/// keep numeric order, so `head10` sorts after `head9`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ContentSection {
    slots: Vec<(String, String)>,
    params: BTreeMap<String, String>,
}

impl ContentSection {
    /// Build a section from `(key, text)` pairs; `params` are applied to every slot.
    pub fn new<I, K, V>(slots: I, params: BTreeMap<String, String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut slots: Vec<(String, String)> = slots
            .into_iter()
            .map(|(k, v)| {
                let raw: String = v.into();
                (k.into(), substitute(&raw, &params))
            })
            .collect();
        slots.sort_by(|a, b| slot_order(&a.0).cmp(&slot_order(&b.0)));
        Self { slots, params }
    }

    /// Decode a section object. Non-string values other than `params` are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let params = object
            .get(PARAMS_KEY)
            .and_then(Value::as_object)
            .map(|p| {
                p.iter()
                    .filter_map(|(k, v)| Some((k.clone(), scalar_text(v)?)))
                    .collect()
            })
            .unwrap_or_default();
        let slots = object
            .iter()
            .filter(|(k, _)| k.as_str() != PARAMS_KEY)
            .filter_map(|(k, v)| Some((k.clone(), v.as_str()?.to_string())));
        Some(Self::new(slots, params))
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.slots
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Text for `key`, or `default` when missing or blank.
    pub fn text_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        match self.get(key) {
            Some(text) if !text.trim().is_empty() => text,
            _ => default,
        }
    }

    pub fn slots(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Replace every occurrence of each parameter key with its value.
fn substitute(text: &str, params: &BTreeMap<String, String>) -> String {
    params
        .iter()
        .filter(|(k, _)| !k.is_empty())
        .fold(text.to_string(), |acc, (k, v)| acc.replace(k.as_str(), v))
}

/// Numeric suffix of a slot key (`head10` → 10). Keys without one sort last.
pub fn slot_number(key: &str) -> Option<u32> {
    let digits_at = key.find(|c: char| c.is_ascii_digit())?;
    key[digits_at..].parse().ok()
}

fn slot_order(key: &str) -> (u32, &str) {
    (slot_number(key).unwrap_or(u32::MAX), key)
}

/// Something the header can trigger without navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderAction {
    Login,
    Logout,
    Profile,
    Orders,
    Search,
}

/// Where a header item leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum NavTarget {
    /// In-app route.
    Route(&'static str),
    /// Link opened in a new window.
    External(&'static str),
    Action(HeaderAction),
    None,
}

impl NavTarget {
    /// Fixed target for a header slot.
    pub fn for_slot(key: &str) -> Self {
        match key {
            "head1" => NavTarget::Route("/"),
            "head2" => NavTarget::External("/affiliate"),
            "head3" => NavTarget::External("/support"),
            "head4" => NavTarget::Route("/subscription"),
            "head5" => NavTarget::External("/sell"),
            "head6" | "head7" => NavTarget::Action(HeaderAction::Search),
            "head8" => NavTarget::Action(HeaderAction::Profile),
            "head9" => NavTarget::Action(HeaderAction::Orders),
            "head10" => NavTarget::Action(HeaderAction::Logout),
            _ => NavTarget::None,
        }
    }
}

/// A rendered header entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderItem {
    pub key: String,
    pub text: String,
    pub target: NavTarget,
    pub order: u32,
}

/// Header entries from the `head*` slots of a section, in slot order.
pub fn header_items(section: &ContentSection) -> Vec<HeaderItem> {
    section
        .slots()
        .filter(|(key, _)| key.starts_with("head"))
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(key, text)| HeaderItem {
            key: key.to_string(),
            text: text.trim().to_string(),
            target: NavTarget::for_slot(key),
            order: slot_number(key).unwrap_or(999),
        })
        .collect()
}

/// Header and home sections for the landing page.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MainPage {
    pub head: ContentSection,
    pub home: ContentSection,
    /// True when the backend could not be reached and built-in text is shown.
    pub fallback: bool,
}

impl MainPage {
    pub fn fallback() -> Self {
        Self {
            head: ContentSection::new(
                [
                    ("head1", "PÁGINA DE INICIO"),
                    ("head2", "AFILIATE"),
                    ("head3", "SOPORTE-POSTVENTA"),
                    ("head4", "SUSCRIPCIÓN"),
                    ("head5", "CONTACTO"),
                    ("head6", "Buscar..."),
                    ("head7", "MI CUENTA"),
                ],
                BTreeMap::new(),
            ),
            home: ContentSection::new(
                [
                    ("home1", "Proporcionando streaming asequible y de alta calidad durante 6 años"),
                    ("home2", "Disfruta de tus servicios favoritos al mejor precio"),
                    ("home3", "250,000+"),
                    ("home4", "6"),
                    ("home5", "500,000+"),
                    ("home6", "años de experiencia"),
                ],
                BTreeMap::new(),
            ),
            fallback: true,
        }
    }
}

/// Everything fetched so far for the active language.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentSnapshot {
    pub language: String,
    pub sections: BTreeMap<String, ContentSection>,
}

impl ContentSnapshot {
    pub fn section(&self, name: &str) -> Option<&ContentSection> {
        self.sections.get(name)
    }
}
