use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub font_size: f32,
    pub group_fill: String,
    pub group_border: String,
    pub group_text_color: String,
    pub line_color: String,
    pub dock_color: String,
    pub background: String,
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            font_family: "\"trebuchet ms\", verdana, arial, sans-serif".to_string(),
            font_size: 14.0,
            group_fill: "#ECECFF".to_string(),
            group_border: "#9370DB".to_string(),
            group_text_color: "#333333".to_string(),
            line_color: "#333333".to_string(),
            dock_color: "#AA3333".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }

    pub fn modern() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            font_size: 13.0,
            group_fill: "#F8FAFF".to_string(),
            group_border: "#C7D2E5".to_string(),
            group_text_color: "#1C2430".to_string(),
            line_color: "#7A8AA6".to_string(),
            dock_color: "#E0603A".to_string(),
            background: "#FFFFFF".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::modern()
    }
}
