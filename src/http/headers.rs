/// Normalizes a header name to hyphen-separated title case.
///
/// The first letter and every letter following a hyphen are upper-cased,
/// everything else lower-cased, so `"content-type"` becomes
/// `"Content-Type"`. The transformation is idempotent.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = true;
    for ch in name.chars() {
        if ch == '-' {
            out.push('-');
            upper_next = true;
        } else if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// One header entry: a normalized name and its values in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub values: Vec<String>,
}

/// An ordered header block.
///
/// Entries keep the order in which their names first appeared. Repeated
/// lines with the same normalized name append to the existing entry rather
/// than creating a duplicate. Lookup is by normalized name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value under `name`, normalizing the name first.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let name = normalize_name(name);
        let value = value.into();
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.values.push(value),
            None => self.entries.push(Header {
                name,
                values: vec![value],
            }),
        }
    }

    /// First value under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entry(name)
            .and_then(|e| e.values.first())
            .map(|v| v.as_str())
    }

    /// All values under `name`, in arrival order.
    pub fn get_all(&self, name: &str) -> &[String] {
        self.entry(name).map(|e| e.values.as_slice()).unwrap_or(&[])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Header> {
        self.entries.iter()
    }

    fn entry(&self, name: &str) -> Option<&Header> {
        let name = normalize_name(name);
        self.entries.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_basic() {
        assert_eq!(normalize_name("content-type"), "Content-Type");
        assert_eq!(normalize_name("HOST"), "Host");
    }

    #[test]
    fn repeated_lines_share_one_entry() {
        let mut headers = Headers::new();
        headers.append("X-Tag", "a");
        headers.append("x-tag", "b");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get_all("X-Tag"), &["a", "b"]);
    }
}
