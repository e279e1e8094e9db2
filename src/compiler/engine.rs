//! The generic matching compiler engine.
//!
//! A compiler is an ordered chain of `(matcher, handler)` rules over IR
//! nodes. Dispatch consults rules in reverse registration order, so a
//! later-registered special case (the byte-buffer declaration) overrides
//! an earlier general one. Handlers receive a [`Harness`] that threads
//! mutable compiler state through recursive compiles and supports scoped
//! state mutation.

use std::rc::Rc;

use tracing::trace;

use crate::error::CompileError;
use crate::ir::Node;

type Rule<A, S> =
    Rc<dyn for<'a> Fn(&Node, &mut Harness<'a, A, S>) -> Option<Result<A, CompileError>>>;

/// An ordered, immutable rule chain producing `A` while threading
/// state `S`.
pub struct Compiler<A, S> {
    rules: Vec<Rule<A, S>>,
}

impl<A, S> Clone for Compiler<A, S> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<A, S> Default for Compiler<A, S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A, S> Compiler<A, S> {
    /// An empty compiler. Running it fails with
    /// [`CompileError::UnsupportedNode`] for every input.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Extend the chain with a rule. The matcher decides whether the
    /// rule applies and extracts the value the handler consumes.
    /// Most recently added rules are consulted first.
    pub fn with_rule<T, M, H>(mut self, matcher: M, handler: H) -> Self
    where
        T: 'static,
        M: Fn(&Node) -> Option<T> + 'static,
        H: for<'a> Fn(T, &mut Harness<'a, A, S>) -> Result<A, CompileError> + 'static,
    {
        self.rules.push(Rc::new(move |node, harness| {
            matcher(node).map(|matched| handler(matched, harness))
        }));
        self
    }

    /// Compile a root node with an initial state, returning the output
    /// and the final state. Failure from any rule propagates; there is
    /// no partial output.
    pub fn run(&self, node: &Node, initial_state: S) -> Result<(A, S), CompileError> {
        let mut state = initial_state;
        let output = self.dispatch(node, &mut state)?;
        Ok((output, state))
    }

    fn dispatch(&self, node: &Node, state: &mut S) -> Result<A, CompileError> {
        for (idx, rule) in self.rules.iter().enumerate().rev() {
            let mut harness = Harness {
                compiler: self,
                state: &mut *state,
            };
            if let Some(result) = rule(node, &mut harness) {
                trace!(tag = %node.tag(), rule = idx, "rule matched");
                return result;
            }
        }
        Err(CompileError::UnsupportedNode(node.tag().to_string()))
    }
}

/// The per-dispatch view handlers use to recurse and to read or mutate
/// compiler state.
pub struct Harness<'a, A, S> {
    compiler: &'a Compiler<A, S>,
    state: &'a mut S,
}

impl<'a, A, S> Harness<'a, A, S> {
    /// Recursively invoke the full rule chain on one node.
    pub fn compile(&mut self, node: &Node) -> Result<A, CompileError> {
        self.compiler.dispatch(node, self.state)
    }

    /// Compile a list of nodes, preserving order.
    pub fn compile_all(&mut self, nodes: &[Node]) -> Result<Vec<A>, CompileError> {
        nodes.iter().map(|node| self.compile(node)).collect()
    }

    /// Read the current state.
    pub fn state(&self) -> &S {
        self.state
    }

    /// Atomically update the state and return a derived value.
    pub fn modify_state<T>(&mut self, f: impl FnOnce(&mut S) -> T) -> T {
        f(self.state)
    }

    /// Push a transformed state, run `thunk`, then restore the state
    /// exactly as it was before the call, including on the error path.
    pub fn with_state<T>(
        &mut self,
        f: impl FnOnce(&S) -> S,
        thunk: impl FnOnce(&mut Self) -> Result<T, CompileError>,
    ) -> Result<T, CompileError> {
        let pushed = f(self.state);
        let saved = std::mem::replace(self.state, pushed);
        let result = thunk(self);
        *self.state = saved;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::matchers::{match_scalar, match_struct};
    use crate::ir::{self, ScalarKind};

    fn counting_compiler() -> Compiler<String, i32> {
        Compiler::new()
            .with_rule(match_scalar, |scalar, harness: &mut Harness<String, i32>| {
                let idx = harness.modify_state(|s| {
                    *s += 1;
                    *s
                });
                Ok(format!("{:?}[{}]", scalar.kind, idx))
            })
            .with_rule(match_struct, |node, harness: &mut Harness<String, i32>| {
                let types: Vec<Node> = node.fields.iter().map(|f| f.ty.clone()).collect();
                let parts = harness.compile_all(&types)?;
                Ok(format!("{{{}}}", parts.join(", ")))
            })
    }

    #[test]
    fn test_empty_compiler_fails() {
        let compiler: Compiler<String, ()> = Compiler::new();
        let err = compiler.run(&ir::string(), ()).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedNode(_)));
    }

    #[test]
    fn test_state_threads_through_recursion() {
        let compiler = counting_compiler();
        let node = ir::struct_of(vec![
            ir::field("a", ir::string()),
            ir::field("b", ir::string()),
        ]);
        let (output, state) = compiler.run(&node, 0).unwrap();
        assert_eq!(output, "{String[1], String[2]}");
        assert_eq!(state, 2);
    }

    #[test]
    fn test_later_rules_win() {
        let compiler = counting_compiler().with_rule(
            match_scalar,
            |_, _: &mut Harness<String, i32>| Ok("override".to_string()),
        );
        let (output, state) = compiler.run(&ir::string(), 0).unwrap();
        assert_eq!(output, "override");
        assert_eq!(state, 0);
    }

    #[test]
    fn test_unmatched_scalar_falls_through() {
        let compiler = counting_compiler();
        let err = compiler.run(&ir::union(vec![]), 0).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedNode(_)));
    }

    #[test]
    fn test_with_state_restores_after_scoped_compile() {
        let compiler: Compiler<i32, Vec<&'static str>> = Compiler::new()
            .with_rule(match_scalar, |scalar, harness: &mut Harness<i32, Vec<&'static str>>| {
                if scalar.kind == ScalarKind::Never {
                    return Err(CompileError::UnsupportedNode("Never".into()));
                }
                Ok(harness.state().len() as i32)
            })
            .with_rule(match_struct, |node, harness: &mut Harness<i32, Vec<&'static str>>| {
                let types: Vec<Node> = node.fields.iter().map(|f| f.ty.clone()).collect();
                harness.with_state(
                    |s| {
                        let mut s = s.clone();
                        s.push("inner");
                        s
                    },
                    |h| Ok(h.compile_all(&types)?.into_iter().sum()),
                )
            });

        let node = ir::struct_of(vec![
            ir::field("a", ir::string()),
            ir::field("b", ir::string()),
        ]);
        let (output, state) = compiler.run(&node, vec!["outer"]).unwrap();
        // Both fields saw the pushed state (len 2); the caller state is restored.
        assert_eq!(output, 4);
        assert_eq!(state, vec!["outer"]);
    }

    #[test]
    fn test_with_state_restores_on_error_path() {
        let never = std::sync::Arc::new(crate::ir::IrNode::Scalar(crate::ir::ScalarNode {
            kind: ScalarKind::Never,
            annotations: crate::ir::Annotations::new(),
        }));

        // The struct rule swallows the scoped failure and reports the
        // state depth it observes afterwards: 1 proves the pushed frame
        // was popped even though the thunk errored.
        let compiler: Compiler<usize, Vec<&'static str>> = Compiler::new()
            .with_rule(match_scalar, |scalar, _: &mut Harness<usize, Vec<&'static str>>| {
                if scalar.kind == ScalarKind::Never {
                    Err(CompileError::UnsupportedNode("Never".into()))
                } else {
                    Ok(0)
                }
            })
            .with_rule(match_struct, |node, harness: &mut Harness<usize, Vec<&'static str>>| {
                let first = node.fields[0].ty.clone();
                let scoped = harness.with_state(
                    |s| {
                        let mut s = s.clone();
                        s.push("inner");
                        s
                    },
                    |h| h.compile(&first),
                );
                assert!(scoped.is_err());
                Ok(harness.state().len())
            });

        let node = ir::struct_of(vec![ir::field("x", never)]);
        let (depth, state) = compiler.run(&node, vec!["outer"]).unwrap();
        assert_eq!(depth, 1);
        assert_eq!(state, vec!["outer"]);
    }
}
