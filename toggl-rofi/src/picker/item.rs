/// Separates the display text from the row options.
const OPTIONS_START: u8 = b'\0';
/// Separates option names, values and pairs.
const UNIT_SEPARATOR: u8 = 0x1f;

/// One row written to the picker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PickerItem {
    /// Row text; may contain pango markup when the picker renders markup rows.
    pub text: String,
    pub icon: Option<String>,
    /// Hidden text the picker also matches against.
    pub meta: Option<String>,
    pub nonselectable: Option<bool>,
    pub info: Option<String>,
    /// Row stays visible regardless of the filter.
    pub permanent: Option<bool>,
}

impl PickerItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn permanent(mut self) -> Self {
        self.permanent = Some(true);
        self
    }

    pub fn nonselectable(mut self) -> Self {
        self.nonselectable = Some(true);
        self
    }

    /// The text as it appears on its own line of the picker's input.
    pub fn display_line(&self) -> String {
        self.text.replace(['\n', '\r'], " ")
    }

    fn options(&self) -> Vec<(&'static str, String)> {
        let flag = |value: bool| value.to_string();
        [
            ("icon", self.icon.clone()),
            ("meta", self.meta.clone()),
            ("nonselectable", self.nonselectable.map(flag)),
            ("info", self.info.clone()),
            ("permanent", self.permanent.map(flag)),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v)))
        .collect()
    }

    /// Append the wire form of this item, newline included, to `buf`.
    pub fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(self.display_line().as_bytes());

        let options = self.options();
        if !options.is_empty() {
            buf.push(OPTIONS_START);
            for (i, (name, value)) in options.iter().enumerate() {
                if i > 0 {
                    buf.push(UNIT_SEPARATOR);
                }
                buf.extend_from_slice(name.as_bytes());
                buf.push(UNIT_SEPARATOR);
                buf.extend_from_slice(sanitize_option(value).as_bytes());
            }
        }

        buf.push(b'\n');
    }
}

fn sanitize_option(value: &str) -> String {
    value.replace(['\n', '\r', '\0', '\u{1f}'], " ")
}

/// Encode `items` in order, one per line.
pub fn encode_items(items: &[PickerItem]) -> Vec<u8> {
    let mut buf = Vec::new();
    for item in items {
        item.encode(&mut buf);
    }
    buf
}
