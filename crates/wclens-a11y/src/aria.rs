//! ARIA roles and attribute vocabulary.

use wclens_dom::{Document, NodeId};

/// ARIA attribute names the auditor recognizes, without the `aria-` prefix.
pub const KNOWN_ARIA_ATTRIBUTES: &[&str] = &[
    "activedescendant",
    "atomic",
    "autocomplete",
    "busy",
    "checked",
    "colcount",
    "colindex",
    "colspan",
    "controls",
    "current",
    "describedby",
    "description",
    "details",
    "disabled",
    "errormessage",
    "expanded",
    "flowto",
    "grabbed",
    "haspopup",
    "hidden",
    "invalid",
    "keyshortcuts",
    "label",
    "labelledby",
    "level",
    "live",
    "modal",
    "multiline",
    "multiselectable",
    "orientation",
    "owns",
    "placeholder",
    "posinset",
    "pressed",
    "readonly",
    "relevant",
    "required",
    "roledescription",
    "rowcount",
    "rowindex",
    "rowspan",
    "selected",
    "setsize",
    "sort",
    "valuemax",
    "valuemin",
    "valuenow",
    "valuetext",
];

/// The subset of ARIA roles the tree builder and auditor reason about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AriaRole {
    Article,
    Banner,
    Button,
    Checkbox,
    Combobox,
    Complementary,
    ContentInfo,
    Dialog,
    Form,
    Generic,
    Group,
    Heading,
    Img,
    Link,
    List,
    ListItem,
    Listbox,
    Main,
    Navigation,
    Option,
    Paragraph,
    ProgressBar,
    Radio,
    Region,
    Search,
    SearchBox,
    Separator,
    Slider,
    SpinButton,
    Switch,
    Table,
    TextBox,
}

impl AriaRole {
    /// Parses an explicit `role` attribute value. Unknown roles yield `None`,
    /// letting the implicit tag role stand.
    pub fn parse(value: &str) -> Option<AriaRole> {
        let role = match value.trim().to_ascii_lowercase().as_str() {
            "article" => AriaRole::Article,
            "banner" => AriaRole::Banner,
            "button" => AriaRole::Button,
            "checkbox" => AriaRole::Checkbox,
            "combobox" => AriaRole::Combobox,
            "complementary" => AriaRole::Complementary,
            "contentinfo" => AriaRole::ContentInfo,
            "dialog" => AriaRole::Dialog,
            "form" => AriaRole::Form,
            "generic" | "none" | "presentation" => AriaRole::Generic,
            "group" => AriaRole::Group,
            "heading" => AriaRole::Heading,
            "img" | "image" => AriaRole::Img,
            "link" => AriaRole::Link,
            "list" => AriaRole::List,
            "listitem" => AriaRole::ListItem,
            "listbox" => AriaRole::Listbox,
            "main" => AriaRole::Main,
            "navigation" => AriaRole::Navigation,
            "option" => AriaRole::Option,
            "paragraph" => AriaRole::Paragraph,
            "progressbar" => AriaRole::ProgressBar,
            "radio" => AriaRole::Radio,
            "region" => AriaRole::Region,
            "search" => AriaRole::Search,
            "searchbox" => AriaRole::SearchBox,
            "separator" => AriaRole::Separator,
            "slider" => AriaRole::Slider,
            "spinbutton" => AriaRole::SpinButton,
            "switch" => AriaRole::Switch,
            "table" => AriaRole::Table,
            "textbox" => AriaRole::TextBox,
            _ => return None,
        };
        Some(role)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AriaRole::Article => "article",
            AriaRole::Banner => "banner",
            AriaRole::Button => "button",
            AriaRole::Checkbox => "checkbox",
            AriaRole::Combobox => "combobox",
            AriaRole::Complementary => "complementary",
            AriaRole::ContentInfo => "contentinfo",
            AriaRole::Dialog => "dialog",
            AriaRole::Form => "form",
            AriaRole::Generic => "generic",
            AriaRole::Group => "group",
            AriaRole::Heading => "heading",
            AriaRole::Img => "img",
            AriaRole::Link => "link",
            AriaRole::List => "list",
            AriaRole::ListItem => "listitem",
            AriaRole::Listbox => "listbox",
            AriaRole::Main => "main",
            AriaRole::Navigation => "navigation",
            AriaRole::Option => "option",
            AriaRole::Paragraph => "paragraph",
            AriaRole::ProgressBar => "progressbar",
            AriaRole::Radio => "radio",
            AriaRole::Region => "region",
            AriaRole::Search => "search",
            AriaRole::SearchBox => "searchbox",
            AriaRole::Separator => "separator",
            AriaRole::Slider => "slider",
            AriaRole::SpinButton => "spinbutton",
            AriaRole::Switch => "switch",
            AriaRole::Table => "table",
            AriaRole::TextBox => "textbox",
        }
    }

    /// Interactive widget roles that users operate directly.
    pub fn is_widget(&self) -> bool {
        matches!(
            self,
            AriaRole::Button
                | AriaRole::Checkbox
                | AriaRole::Combobox
                | AriaRole::Link
                | AriaRole::Listbox
                | AriaRole::Option
                | AriaRole::Radio
                | AriaRole::SearchBox
                | AriaRole::Slider
                | AriaRole::SpinButton
                | AriaRole::Switch
                | AriaRole::TextBox
        )
    }

    /// Landmark roles used for page-level navigation.
    pub fn is_landmark(&self) -> bool {
        matches!(
            self,
            AriaRole::Banner
                | AriaRole::Complementary
                | AriaRole::ContentInfo
                | AriaRole::Form
                | AriaRole::Main
                | AriaRole::Navigation
                | AriaRole::Region
                | AriaRole::Search
        )
    }

    /// Roles that must expose an accessible name to assistive tech.
    pub fn requires_name(&self) -> bool {
        self.is_widget() || matches!(self, AriaRole::Img | AriaRole::Dialog)
    }

    /// Roles whose name may be computed from their text content.
    pub fn supports_name_from_content(&self) -> bool {
        matches!(
            self,
            AriaRole::Button
                | AriaRole::Checkbox
                | AriaRole::Heading
                | AriaRole::Link
                | AriaRole::ListItem
                | AriaRole::Option
                | AriaRole::Radio
                | AriaRole::Switch
        )
    }
}

/// Computes the role of an element: an explicit `role` attribute wins,
/// otherwise the implicit role of the tag (and `type` for inputs).
pub fn computed_role(doc: &Document, id: NodeId) -> AriaRole {
    if let Some(value) = doc.attribute(id, "role") {
        if let Some(role) = AriaRole::parse(value) {
            return role;
        }
    }
    let Some(tag) = doc.tag_name(id) else {
        return AriaRole::Generic;
    };
    match tag {
        "a" => {
            if doc.attribute(id, "href").is_some() {
                AriaRole::Link
            } else {
                AriaRole::Generic
            }
        }
        "article" => AriaRole::Article,
        "aside" => AriaRole::Complementary,
        "button" => AriaRole::Button,
        "dialog" => AriaRole::Dialog,
        "footer" => AriaRole::ContentInfo,
        "form" => AriaRole::Form,
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => AriaRole::Heading,
        "header" => AriaRole::Banner,
        "hr" => AriaRole::Separator,
        "img" => AriaRole::Img,
        "input" => input_role(doc, id),
        "li" => AriaRole::ListItem,
        "main" => AriaRole::Main,
        "nav" => AriaRole::Navigation,
        "ol" | "ul" => AriaRole::List,
        "option" => AriaRole::Option,
        "p" => AriaRole::Paragraph,
        "progress" => AriaRole::ProgressBar,
        "section" => AriaRole::Region,
        "select" => {
            if doc.attribute(id, "multiple").is_some() {
                AriaRole::Listbox
            } else {
                AriaRole::Combobox
            }
        }
        "table" => AriaRole::Table,
        "textarea" => AriaRole::TextBox,
        _ => AriaRole::Generic,
    }
}

fn input_role(doc: &Document, id: NodeId) -> AriaRole {
    let ty = doc
        .attribute(id, "type")
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string());
    match ty.as_str() {
        "button" | "submit" | "reset" | "image" => AriaRole::Button,
        "checkbox" => AriaRole::Checkbox,
        "radio" => AriaRole::Radio,
        "range" => AriaRole::Slider,
        "number" => AriaRole::SpinButton,
        "search" => AriaRole::SearchBox,
        "hidden" => AriaRole::Generic,
        _ => AriaRole::TextBox,
    }
}
