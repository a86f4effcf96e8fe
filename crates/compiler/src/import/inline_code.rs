//! Parsing and validation of inline-code templates.
//!
//! A template is script text with typed placeholders: `{this}` for the
//! receiver, `{name}` for a parameter or type parameter, `{*name}` for a
//! parameter array expanded into the argument list, `{@name}` for a
//! parameter required to be a literal string, and `{$Dotted.Name}` for a
//! type reference. Literal braces are written `{{` and `}}`.

use crate::import::reserved::{is_valid_dotted_identifier, is_valid_identifier};
use crate::model::Method;
use logos::Logos;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
enum TemplateToken {
    #[token("{{")]
    OpenEscape,
    #[token("}}")]
    CloseEscape,
    #[regex(r"\{[^{}]*\}")]
    Placeholder,
    #[regex(r"[^{}]+")]
    Text,
}

/// How a parameter placeholder is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamModifier {
    /// Substitute the argument expression.
    None,
    /// Splice the elements of a parameter array.
    ExpandParams,
    /// Substitute the argument, which must be a literal string at the use
    /// site.
    LiteralString,
}

/// One parsed piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    Text(String),
    This,
    /// A parameter or type parameter by name.
    Param { name: String, modifier: ParamModifier },
    /// A fully qualified type reference.
    TypeName(String),
}

/// Parse a template without signature context.
pub fn parse_template(code: &str) -> Result<Vec<Segment>, String> {
    let mut segments: Vec<Segment> = Vec::new();
    let mut push_text = |segments: &mut Vec<Segment>, text: &str| {
        if let Some(Segment::Text(prev)) = segments.last_mut() {
            prev.push_str(text);
        } else {
            segments.push(Segment::Text(text.to_string()));
        }
    };

    let mut lexer = TemplateToken::lexer(code);
    while let Some(token) = lexer.next() {
        match token {
            Ok(TemplateToken::Text) => push_text(&mut segments, lexer.slice()),
            Ok(TemplateToken::OpenEscape) => push_text(&mut segments, "{"),
            Ok(TemplateToken::CloseEscape) => push_text(&mut segments, "}"),
            Ok(TemplateToken::Placeholder) => {
                let inner = &lexer.slice()[1..lexer.slice().len() - 1];
                segments.push(parse_placeholder(inner)?);
            }
            Err(()) => return Err(format!("unbalanced brace at offset {}", lexer.span().start)),
        }
    }
    Ok(segments)
}

fn parse_placeholder(inner: &str) -> Result<Segment, String> {
    if inner == "this" {
        return Ok(Segment::This);
    }
    if let Some(name) = inner.strip_prefix('$') {
        if !is_valid_dotted_identifier(name) {
            return Err(format!("`{{{inner}}}` is not a valid type reference"));
        }
        return Ok(Segment::TypeName(name.to_string()));
    }
    let (modifier, name) = if let Some(name) = inner.strip_prefix('*') {
        (ParamModifier::ExpandParams, name)
    } else if let Some(name) = inner.strip_prefix('@') {
        (ParamModifier::LiteralString, name)
    } else {
        (ParamModifier::None, inner)
    };
    if !is_valid_identifier(name) {
        return Err(format!("`{{{inner}}}` is not a valid placeholder"));
    }
    Ok(Segment::Param { name: name.to_string(), modifier })
}

/// Parse a template and check every placeholder against the method's
/// signature. `type_params` are the declaring type's parameters.
pub fn validate_template(
    code: &str,
    method: &Method,
    type_params: &[String],
) -> Result<Vec<Segment>, String> {
    let segments = parse_template(code)?;
    for segment in &segments {
        match segment {
            Segment::This => {
                if method.is_static || method.is_constructor {
                    return Err("`{this}` can only be used in an instance method".to_string());
                }
            }
            Segment::Param { name, modifier } => {
                let param = method.params.iter().find(|p| &p.name == name);
                let is_type_param = method.type_params.iter().any(|p| p == name)
                    || type_params.iter().any(|p| p == name);
                match param {
                    Some(param) => {
                        if *modifier == ParamModifier::ExpandParams && !param.is_params {
                            return Err(format!(
                                "`{{*{name}}}` requires `{name}` to be a parameter array"
                            ));
                        }
                    }
                    None if is_type_param => {
                        if *modifier != ParamModifier::None {
                            return Err(format!(
                                "type parameter `{name}` cannot take a modifier"
                            ));
                        }
                    }
                    None => {
                        return Err(format!("`{{{name}}}` does not match any parameter"));
                    }
                }
            }
            Segment::Text(_) | Segment::TypeName(_) => {}
        }
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, Param, TypeId, TypeRef};

    fn method_with_params(names: &[&str], last_is_params: bool) -> Method {
        let mut params: Vec<Param> = names
            .iter()
            .map(|n| Param::new(*n, TypeRef::Dynamic))
            .collect();
        if last_is_params {
            if let Some(last) = params.pop() {
                params.push(last.params_array());
            }
        }
        Method::new(TypeId(0), "m").with_params(params)
    }

    #[test]
    fn test_parse_segments() {
        let segments = parse_template("{$Script}.isValue({this}, {a})").unwrap();
        assert_eq!(segments[0], Segment::TypeName("Script".into()));
        assert!(matches!(segments[2], Segment::This));
        assert_eq!(
            segments[4],
            Segment::Param { name: "a".into(), modifier: ParamModifier::None }
        );
    }

    #[test]
    fn test_escaped_braces_are_text() {
        let segments = parse_template("{{ x: {a} }}").unwrap();
        assert_eq!(segments[0], Segment::Text("{ x: ".into()));
        assert_eq!(segments.last(), Some(&Segment::Text(" }".into())));
    }

    #[test]
    fn test_unknown_parameter_rejected() {
        let method = method_with_params(&["a"], false);
        let err = validate_template("f({b})", &method, &[]).unwrap_err();
        assert!(err.contains("does not match"));
    }

    #[test]
    fn test_expansion_requires_param_array() {
        let method = method_with_params(&["a", "rest"], false);
        assert!(validate_template("f({*rest})", &method, &[]).is_err());
        let method = method_with_params(&["a", "rest"], true);
        assert!(validate_template("f({*rest})", &method, &[]).is_ok());
    }

    #[test]
    fn test_this_requires_instance() {
        let mut method = method_with_params(&[], false);
        method.is_static = true;
        assert!(validate_template("{this}.x", &method, &[]).is_err());
    }

    #[test]
    fn test_unbalanced_brace_rejected() {
        assert!(parse_template("f({a)").is_err());
    }
}
