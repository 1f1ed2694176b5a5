use serde::Serialize;

use dicey_core::engine::RollAnswer;

/// Discord caps one action row at five buttons and one message at five rows.
pub const MAX_BUTTONS_PER_ROW: usize = 5;
pub const MAX_ROWS_PER_MESSAGE: usize = 5;

pub const EMBED_TITLE_LIMIT: usize = 256;
pub const EMBED_DESCRIPTION_LIMIT: usize = 4096;
pub const EMBED_FIELD_LIMIT: usize = 25;
pub const EMBED_FIELD_NAME_LIMIT: usize = 256;
pub const EMBED_FIELD_VALUE_LIMIT: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonStyle {
    Primary,
    Success,
    Danger,
    Secondary,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ButtonComponent {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

impl ButtonComponent {
    pub fn new(custom_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self { custom_id: custom_id.into(), label: label.into(), style: ButtonStyle::Primary }
    }

    pub fn style(mut self, style: ButtonStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComponentRow {
    pub components: Vec<ButtonComponent>,
}

/// Splits a flat button list into rows of five, in order.
pub fn partition_buttons(buttons: Vec<ButtonComponent>) -> Vec<ComponentRow> {
    let mut rows = Vec::new();
    let mut current = Vec::new();

    for button in buttons {
        if current.len() == MAX_BUTTONS_PER_ROW {
            rows.push(ComponentRow { components: std::mem::take(&mut current) });
        }
        current.push(button);
    }
    if !current.is_empty() {
        rows.push(ComponentRow { components: current });
    }

    rows
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub content: String,
    pub rows: Vec<ComponentRow>,
}

impl MessageTemplate {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into(), rows: Vec::new() }
    }

    pub fn with_rows(content: impl Into<String>, rows: Vec<ComponentRow>) -> Self {
        Self { content: content.into(), rows }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EmbedTemplate {
    pub title: String,
    pub description: String,
    pub fields: Vec<EmbedField>,
}

impl EmbedTemplate {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: truncate_chars(title.into(), EMBED_TITLE_LIMIT),
            description: truncate_chars(description.into(), EMBED_DESCRIPTION_LIMIT),
            fields: Vec::new(),
        }
    }

    /// Adds a non-inline field; fields beyond the platform cap are dropped.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if self.fields.len() < EMBED_FIELD_LIMIT {
            self.fields.push(EmbedField {
                name: truncate_chars(name.into(), EMBED_FIELD_NAME_LIMIT),
                value: truncate_chars(value.into(), EMBED_FIELD_VALUE_LIMIT),
                inline: false,
            });
        }
        self
    }
}

pub fn answer_embed(answer: &RollAnswer) -> EmbedTemplate {
    let mut embed = EmbedTemplate::new(&answer.title, &answer.detail);
    for (name, value) in &answer.fields {
        embed = embed.field(name, value);
    }
    embed
}

fn truncate_chars(value: String, limit: usize) -> String {
    if value.chars().count() <= limit {
        value
    } else {
        value.chars().take(limit).collect()
    }
}
