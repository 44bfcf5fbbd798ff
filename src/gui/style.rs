use iced::{Background, Border, Color, Shadow, Theme, Vector};
use iced::widget::button;
use iced::widget::container;

/// Button drawn as plain text, used for the entries of the device list.
pub struct TextButtonStyleSheet;

impl button::StyleSheet for TextButtonStyleSheet {
    type Style = Theme;

    fn active(&self, _style: &Self::Style) -> button::Appearance {
        button::Appearance {
            shadow_offset: Default::default(),
            background: None,
            text_color: Color::BLACK,
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 0.0.into(),
            },
            shadow: Shadow::default(),
        }
    }

    fn hovered(&self, style: &Self::Style) -> button::Appearance {
        button::Appearance {
            background: Some(Background::Color(Color::from_rgb8(0xEE, 0xF2, 0xFA))),
            ..self.active(style)
        }
    }
}

/// Rounded, tinted box around the radius and distance sections.
pub struct CardStyleSheet {
    pub background: Color,
}

impl container::StyleSheet for CardStyleSheet {
    type Style = Theme;

    fn appearance(&self, _style: &Self::Style) -> container::Appearance {
        container::Appearance {
            text_color: None,
            background: Some(Background::Color(self.background)),
            border: Border {
                color: Color::TRANSPARENT,
                width: 0.0,
                radius: 16.0.into(),
            },
            shadow: Shadow {
                color: Color::from_rgba(0.0, 0.0, 0.0, 0.15),
                offset: Vector::new(0.0, 2.0),
                blur_radius: 4.0,
            },
        }
    }
}

pub const RADIUS_CARD_COLOR: Color = Color { r: 0.86, g: 0.91, b: 1.0, a: 1.0 };
pub const DISTANCE_CARD_COLOR: Color = Color { r: 0.88, g: 0.95, b: 0.90, a: 1.0 };
