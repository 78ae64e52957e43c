//! Printing the token tree back to source text.

use crate::{CallExpr, Element, Group, Program, Token};

/// Quotes `value` as a double-quoted, JSON-escaped string literal.
///
/// JSON string syntax is a subset of JavaScript's, so the result is always a
/// valid JavaScript literal.
pub fn quote_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

impl Program {
    /// Prints the tree. An unmodified tree prints its input exactly.
    pub fn print(&self) -> String {
        let mut out = String::new();
        print_elements(&self.elements, &mut out);
        print_token(&self.eof, &mut out);
        out
    }
}

fn print_token(token: &Token, out: &mut String) {
    out.push_str(&token.leading_trivia);
    out.push_str(&token.text);
}

fn print_elements(elements: &[Element], out: &mut String) {
    for element in elements {
        match element {
            Element::Token(token) => print_token(token, out),
            Element::Group(group) => print_group(group, out),
            Element::Call(call) => print_call(call, out),
        }
    }
}

fn print_group(group: &Group, out: &mut String) {
    print_token(&group.open, out);
    print_elements(&group.elements, out);
    print_token(&group.close, out);
}

fn print_call(call: &CallExpr, out: &mut String) {
    print_token(&call.callee, out);
    print_token(&call.open, out);
    let count = call.arguments.len().max(call.separators.len());
    for i in 0..count {
        if let Some(argument) = call.arguments.get(i) {
            print_elements(&argument.elements, out);
        }
        if let Some(separator) = call.separators.get(i) {
            print_token(separator, out);
        }
    }
    print_token(&call.close, out);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_string() {
        assert_eq!(quote_string("./src/a.js"), "\"./src/a.js\"");
        assert_eq!(quote_string("./we\"ird\\name.js"), r#""./we\"ird\\name.js""#);
        assert_eq!(quote_string("line\nbreak"), r#""line\nbreak""#);
    }
}
