//! Children passed to a component call.

/// Content placed inside a component.
///
/// Anything that converts into `Children` can be passed: strings, numbers,
/// booleans, options and (nested) vectors of those.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Children {
    #[default]
    None,
    Text(String),
    Many(Vec<Children>),
}

impl Children {
    /// Flatten into the markup string handed to the render function.
    pub fn normalize(&self) -> String {
        let mut out = String::new();
        self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) {
        match self {
            Children::None => {}
            Children::Text(text) => out.push_str(text),
            Children::Many(items) => items.iter().for_each(|item| item.write(out)),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Children::None => true,
            Children::Text(text) => text.is_empty(),
            Children::Many(items) => items.iter().all(Children::is_empty),
        }
    }
}

impl From<&str> for Children {
    fn from(text: &str) -> Self {
        Children::Text(text.to_string())
    }
}

impl From<String> for Children {
    fn from(text: String) -> Self {
        Children::Text(text)
    }
}

impl From<&String> for Children {
    fn from(text: &String) -> Self {
        Children::Text(text.clone())
    }
}

macro_rules! children_from_display {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Children {
                fn from(value: $ty) -> Self {
                    Children::Text(value.to_string())
                }
            }
        )*
    };
}

children_from_display!(bool, char, i32, i64, u32, u64, usize, f32, f64);

impl<T: Into<Children>> From<Vec<T>> for Children {
    fn from(items: Vec<T>) -> Self {
        Children::Many(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Children>> From<Option<T>> for Children {
    fn from(item: Option<T>) -> Self {
        item.map_or(Children::None, Into::into)
    }
}

impl From<()> for Children {
    fn from(_: ()) -> Self {
        Children::None
    }
}
