//! Call-expression traversal.
//!
//! Both walks are pre-order: a call is visited before the calls nested in
//! its arguments, and siblings in source order.

use crate::{CallExpr, Element, Program};

impl Program {
    /// Visits every call expression mutably, stopping at the first error.
    pub fn try_for_each_call_mut<E, F>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&mut CallExpr) -> Result<(), E>,
    {
        walk_elements_mut(&mut self.elements, &mut f)
    }

    /// Every call expression, in source order.
    pub fn calls(&self) -> Vec<&CallExpr> {
        let mut out = Vec::new();
        collect_calls(&self.elements, &mut out);
        out
    }

    /// Every call expression whose callee is the identifier `name`.
    pub fn find_calls(&self, name: &str) -> Vec<&CallExpr> {
        self.calls().into_iter().filter(|call| call.name() == name).collect()
    }
}

fn walk_elements_mut<E, F>(elements: &mut [Element], f: &mut F) -> Result<(), E>
where
    F: FnMut(&mut CallExpr) -> Result<(), E>,
{
    for element in elements {
        match element {
            Element::Token(_) => {}
            Element::Group(group) => walk_elements_mut(&mut group.elements, f)?,
            Element::Call(call) => {
                f(call)?;
                for argument in &mut call.arguments {
                    walk_elements_mut(&mut argument.elements, f)?;
                }
            }
        }
    }
    Ok(())
}

fn collect_calls<'a>(elements: &'a [Element], out: &mut Vec<&'a CallExpr>) {
    for element in elements {
        match element {
            Element::Token(_) => {}
            Element::Group(group) => collect_calls(&group.elements, out),
            Element::Call(call) => {
                out.push(call);
                for argument in &call.arguments {
                    collect_calls(&argument.elements, out);
                }
            }
        }
    }
}
