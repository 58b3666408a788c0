use ammonia::clean;
use diesel::{
    deserialize::Queryable,
    pg::Pg,
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{
    self, de::Visitor, Deserialize, Deserializer, Serialize, Serializer,
};
use std::{
    fmt::{self, Display},
    io::Write,
    ops::Deref,
};

/// A string which is guaranteed to not contain any harmful HTML.
///
/// Any value assigned to it is passed through ammonia before being stored.
#[derive(Debug, Clone, AsExpression, FromSqlRow, Default, PartialEq, Eq)]
#[sql_type = "Text"]
pub struct SafeString {
    value: String,
}

impl SafeString {
    pub fn new(value: &str) -> Self {
        SafeString {
            value: clean(value),
        }
    }

    pub fn set(&mut self, value: &str) {
        self.value = clean(value);
    }

    pub fn get(&self) -> &str {
        &self.value
    }
}

impl Serialize for SafeString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.value)
    }
}

struct SafeStringVisitor;

impl<'de> Visitor<'de> for SafeStringVisitor {
    type Value = SafeString;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string")
    }

    fn visit_str<E>(self, value: &str) -> Result<SafeString, E>
    where
        E: serde::de::Error,
    {
        Ok(SafeString::new(value))
    }
}

impl<'de> Deserialize<'de> for SafeString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_string(SafeStringVisitor)
    }
}

impl Queryable<Text, Pg> for SafeString {
    type Row = String;

    fn build(value: Self::Row) -> Self {
        SafeString::new(&value)
    }
}

impl ToSql<Text, Pg> for SafeString {
    fn to_sql<W: Write>(&self, out: &mut Output<'_, W, Pg>) -> serialize::Result {
        <String as ToSql<Text, Pg>>::to_sql(&self.value, out)
    }
}

impl Deref for SafeString {
    type Target = str;

    fn deref(&self) -> &str {
        &self.value
    }
}

impl Display for SafeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_are_stripped() {
        let s = SafeString::new("Hello <script>alert('xss')</script>world");
        assert!(!s.get().contains("<script>"));
        assert!(s.get().contains("Hello"));
    }

    #[test]
    fn plain_text_is_kept() {
        let s = SafeString::new("Just a regular post body.");
        assert_eq!(s.get(), "Just a regular post body.");
    }
}
