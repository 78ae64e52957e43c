//! Runtime bootstrap rendering.
//!
//! A chunk renders to one immediately-invoked function holding a table of
//! module wrappers, a caching `require`, and the entry module's source
//! executed inline:
//!
//! ```js
//! (() => {
//!   var modules = {
//!     "./src/a.js": (module, exports, require) => {
//! module.exports = 42;
//!     },
//!   };
//!   var cache = {};
//!   function require(moduleId) { ... }
//!   var module = (cache["./src/index.js"] = { exports: {} });
//!   var exports = module.exports;
//! console.log(require("./src/a.js"));
//! })();
//! ```
//!
//! Module sources are embedded verbatim at column zero; only the scaffolding
//! is indented.

use crate::CodegenError;

const INDENT: &str = "  ";

/// One module as it appears in the chunk's table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeModule<'a> {
    pub id: &'a str,
    pub source: &'a str,
}

/// Everything needed to render one chunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSource<'a> {
    /// Id of the module executed directly at load time.
    pub entry: &'a str,
    /// Table contents in emission order; must include the entry.
    pub modules: Vec<RuntimeModule<'a>>,
}

/// Indentation-aware text builder for the runtime scaffolding.
#[derive(Debug, Default)]
pub struct RuntimeWriter {
    buf: String,
    depth: usize,
}

impl RuntimeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes one indented line.
    pub fn line(&mut self, text: &str) -> &mut Self {
        for _ in 0..self.depth {
            self.buf.push_str(INDENT);
        }
        self.buf.push_str(text);
        self.buf.push('\n');
        self
    }

    /// Writes `text` as-is, terminated by a newline if it lacks one.
    pub fn verbatim(&mut self, text: &str) -> &mut Self {
        self.buf.push_str(text);
        if !text.is_empty() && !text.ends_with('\n') {
            self.buf.push('\n');
        }
        self
    }

    pub fn indent(&mut self) -> &mut Self {
        self.depth += 1;
        self
    }

    pub fn dedent(&mut self) -> &mut Self {
        self.depth = self.depth.saturating_sub(1);
        self
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

/// Quotes a module id as a JavaScript string literal.
fn quote_id(id: &str) -> String {
    serde_json::Value::String(id.to_string()).to_string()
}

/// Drops a byte order mark and a `#!` line, which are only legal at the
/// very start of a script.
fn module_body(source: &str) -> &str {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    if source.starts_with("#!") {
        match source.find('\n') {
            Some(newline) => &source[newline + 1..],
            None => "",
        }
    } else {
        source
    }
}

/// Renders the runtime bundle for one chunk.
pub fn render_chunk(chunk: &ChunkSource<'_>) -> Result<String, CodegenError> {
    let entry = chunk
        .modules
        .iter()
        .find(|module| module.id == chunk.entry)
        .ok_or_else(|| CodegenError::new(format!("entry module '{}' is not part of the chunk", chunk.entry)))?;

    let mut w = RuntimeWriter::new();
    w.line("(() => {").indent();

    w.line("var modules = {").indent();
    for module in &chunk.modules {
        w.line(&format!("{}: (module, exports, require) => {{", quote_id(module.id)));
        w.verbatim(module_body(module.source));
        w.line("},");
    }
    w.dedent().line("};");

    w.line("var cache = {};");
    w.line("function require(moduleId) {").indent();
    w.line("var cachedModule = cache[moduleId];");
    w.line("if (cachedModule !== undefined) {").indent();
    w.line("return cachedModule.exports;");
    w.dedent().line("}");
    w.line("if (!Object.prototype.hasOwnProperty.call(modules, moduleId)) {").indent();
    w.line("throw new Error(\"Cannot find module '\" + moduleId + \"'\");");
    w.dedent().line("}");
    w.line("var module = (cache[moduleId] = { exports: {} });");
    w.line("modules[moduleId](module, module.exports, require);");
    w.line("return module.exports;");
    w.dedent().line("}");

    // Seed the cache so a cycle back to the entry sees the same exports.
    w.line(&format!("var module = (cache[{}] = {{ exports: {{}} }});", quote_id(entry.id)));
    w.line("var exports = module.exports;");
    w.verbatim(module_body(entry.source));

    w.dedent().line("})();");
    Ok(w.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_modules<'a>() -> ChunkSource<'a> {
        ChunkSource {
            entry: "./src/index.js",
            modules: vec![
                RuntimeModule {
                    id: "./src/index.js",
                    source: "const a = require(\"./src/a.js\");\nconsole.log(a);",
                },
                RuntimeModule {
                    id: "./src/a.js",
                    source: "module.exports = 42;\n",
                },
            ],
        }
    }

    #[test]
    fn test_render_layout() {
        let text = render_chunk(&two_modules()).unwrap();
        let expected = r#"(() => {
  var modules = {
    "./src/index.js": (module, exports, require) => {
const a = require("./src/a.js");
console.log(a);
    },
    "./src/a.js": (module, exports, require) => {
module.exports = 42;
    },
  };
  var cache = {};
  function require(moduleId) {
    var cachedModule = cache[moduleId];
    if (cachedModule !== undefined) {
      return cachedModule.exports;
    }
    if (!Object.prototype.hasOwnProperty.call(modules, moduleId)) {
      throw new Error("Cannot find module '" + moduleId + "'");
    }
    var module = (cache[moduleId] = { exports: {} });
    modules[moduleId](module, module.exports, require);
    return module.exports;
  }
  var module = (cache["./src/index.js"] = { exports: {} });
  var exports = module.exports;
const a = require("./src/a.js");
console.log(a);
})();
"#;
        assert_eq!(text, expected);
    }

    #[test]
    fn test_require_consults_cache_before_running_factory() {
        let text = render_chunk(&two_modules()).unwrap();
        let at = |needle: &str| text.find(needle).unwrap_or_else(|| panic!("missing {:?}", needle));

        let lookup = at("var cachedModule = cache[moduleId];");
        let hit = at("return cachedModule.exports;");
        let store = at("var module = (cache[moduleId] = { exports: {} });");
        let invoke = at("modules[moduleId](module, module.exports, require);");
        assert!(lookup < hit && hit < store && store < invoke);
        assert_eq!(text.matches("modules[moduleId](").count(), 1);

        let seeded = at(r#"var module = (cache["./src/index.js"] = { exports: {} });"#);
        let inline_entry = text.rfind("console.log(a);").unwrap();
        assert!(invoke < seeded && seeded < inline_entry);
    }

    #[test]
    fn test_ids_are_escaped() {
        let chunk = ChunkSource {
            entry: "./we\"ird.js",
            modules: vec![RuntimeModule { id: "./we\"ird.js", source: "1;" }],
        };
        let text = render_chunk(&chunk).unwrap();
        assert!(text.contains(r#""./we\"ird.js": (module, exports, require) => {"#));
        assert!(text.contains(r#"cache["./we\"ird.js"]"#));
    }

    #[test]
    fn test_line_comment_at_end_of_source() {
        let chunk = ChunkSource {
            entry: "./a.js",
            modules: vec![RuntimeModule { id: "./a.js", source: "x(); // trailing" }],
        };
        let text = render_chunk(&chunk).unwrap();
        assert!(text.contains("x(); // trailing\n    },\n"));
        assert!(text.ends_with("x(); // trailing\n})();\n"));
    }

    #[test]
    fn test_hashbang_is_dropped() {
        let chunk = ChunkSource {
            entry: "./cli.js",
            modules: vec![RuntimeModule { id: "./cli.js", source: "#!/usr/bin/env node\nrun();\n" }],
        };
        let text = render_chunk(&chunk).unwrap();
        assert!(!text.contains("#!"));
        assert!(text.contains("run();"));
    }

    #[test]
    fn test_missing_entry() {
        let chunk = ChunkSource { entry: "./nope.js", modules: vec![] };
        let err = render_chunk(&chunk).unwrap_err();
        assert!(err.message.contains("./nope.js"));
    }
}
