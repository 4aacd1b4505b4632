//! Heuristic mapping from a qualified call-site name plus file path to an
//! owning class/method pair.
//!
//! This is a lexical convention guess, not semantic analysis: it knows
//! about dotted member access, `::` scoping, and the habit of naming files
//! after the class they contain. It is deliberately approximate for naming
//! schemes it was not designed around.

use std::path::Path;

/// Result of class/method inference. `method_name` is the trailing segment
/// of the input, or `constructor` when the input looks like a constructor
/// call of the file's class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferredOwner {
    pub class_name: String,
    pub method_name: Option<String>,
}

/// Infer the owning class and method for `full_name` declared in
/// `file_path`. Pure and infallible.
#[must_use]
pub fn infer_owner(full_name: &str, file_path: &Path) -> InferredOwner {
    if full_name.contains('.') {
        let parts: Vec<&str> = full_name.split('.').collect();
        let method_name = parts[parts.len() - 1].to_string();

        // Maximal leading run of segments that start uppercase; those are
        // taken to be the class path (`Foo.Bar.baz` -> `Foo.Bar`).
        let mut class_parts: Vec<&str> = Vec::new();
        for part in &parts[..parts.len() - 1] {
            if part.chars().next().is_some_and(char::is_uppercase) {
                class_parts.push(part);
            } else if class_parts.is_empty() {
                // Instance receiver (`service.doWork`): fall back to the
                // class the file is named after.
                return InferredOwner {
                    class_name: class_from_file_name(file_path),
                    method_name: Some(method_name),
                };
            }
        }

        let class_name = if class_parts.is_empty() {
            parts[..parts.len() - 1].join(".")
        } else {
            class_parts.join(".")
        };
        InferredOwner {
            class_name,
            method_name: Some(method_name),
        }
    } else if full_name.contains("::") {
        let parts: Vec<&str> = full_name.split("::").collect();
        InferredOwner {
            class_name: parts[..parts.len() - 1].join("::"),
            method_name: Some(parts[parts.len() - 1].to_string()),
        }
    } else {
        let class_name = class_from_file_name(file_path);
        let method_name = if full_name == class_name
            || full_name == format!("new{class_name}")
            || full_name == format!("New{class_name}")
        {
            // Constructor-style call (`NewUser` in user.go).
            "constructor".to_string()
        } else {
            full_name.to_string()
        };
        InferredOwner {
            class_name,
            method_name: Some(method_name),
        }
    }
}

/// `user_service.ts` -> `UserService`: strip the extension, split on
/// `_`/`-`/`.`, title-case each piece and concatenate.
fn class_from_file_name(file_path: &Path) -> String {
    let stem = file_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.split(['_', '-', '.'])
        .map(title_case)
        .collect::<Vec<_>>()
        .join("")
}

fn title_case(piece: &str) -> String {
    let mut chars = piece.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn infer(full_name: &str, file_path: &str) -> (String, Option<String>) {
        let owner = infer_owner(full_name, Path::new(file_path));
        (owner.class_name, owner.method_name)
    }

    #[test]
    fn dotted_name_with_class_run() {
        assert_eq!(
            infer("Foo.Bar.baz", "x.ts"),
            ("Foo.Bar".into(), Some("baz".into()))
        );
    }

    #[test]
    fn dotted_name_stops_collecting_after_lowercase_segment() {
        assert_eq!(
            infer("Foo.bar.baz", "x.ts"),
            ("Foo".into(), Some("baz".into()))
        );
    }

    #[test]
    fn dotted_instance_receiver_falls_back_to_file_name() {
        assert_eq!(
            infer("service.doWork", "user_service.ts"),
            ("UserService".into(), Some("doWork".into()))
        );
    }

    #[test]
    fn cpp_scoped_name() {
        assert_eq!(
            infer("ns::Widget::render", "x.cpp"),
            ("ns::Widget".into(), Some("render".into()))
        );
    }

    #[test]
    fn bare_name_uses_file_name_class() {
        assert_eq!(
            infer("doWork", "user_service.ts"),
            ("UserService".into(), Some("doWork".into()))
        );
    }

    #[test]
    fn bare_name_with_hyphen_and_dot_separators() {
        assert_eq!(
            infer("handle", "http-request.handler.ts"),
            ("HttpRequestHandler".into(), Some("handle".into()))
        );
    }

    #[test]
    fn go_style_constructor() {
        assert_eq!(
            infer("NewUser", "user.go"),
            ("User".into(), Some("constructor".into()))
        );
    }

    #[test]
    fn lowercase_new_constructor() {
        assert_eq!(
            infer("newUser", "user.go"),
            ("User".into(), Some("constructor".into()))
        );
    }

    #[test]
    fn class_named_like_file_is_a_constructor() {
        assert_eq!(
            infer("User", "user.go"),
            ("User".into(), Some("constructor".into()))
        );
    }

    #[test]
    fn bare_name_in_nested_path_uses_base_name_only() {
        assert_eq!(
            infer("run", "src/jobs/batch_runner.ts"),
            ("BatchRunner".into(), Some("run".into()))
        );
    }
}
