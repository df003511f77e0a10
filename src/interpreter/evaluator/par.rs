use std::thread;

use log::debug;

use crate::{
    ast::Stmt,
    error::RuntimeError,
    interpreter::evaluator::{
        core::{EvalResult, Flow, Interp},
        env::Env,
    },
};

impl Interp {
    /// Executes the children of a `par` block as parallel tasks.
    ///
    /// Each direct child statement runs on its own thread, sharing the
    /// enclosing environment by reference. The closing brace is a barrier:
    /// every child is joined before this function returns, so all writes
    /// performed by the children are visible to subsequent statements.
    ///
    /// Failures do not interrupt siblings. All children run to completion;
    /// afterwards the first error in child order is propagated. When no
    /// child failed but one unwound with `return`, the first such return is
    /// propagated to the enclosing function.
    pub(crate) fn exec_par(&self, body: &[Stmt], env: &Env, line: usize) -> EvalResult<Flow> {
        if body.is_empty() {
            return Ok(Flow::Normal);
        }
        debug!("par: launching {} tasks (line {line})", body.len());

        let results: Vec<EvalResult<Flow>> = thread::scope(|scope| {
            let handles: Vec<_> = body.iter()
                                      .map(|stmt| scope.spawn(move || self.exec_stmt(stmt, env)))
                                      .collect();
            handles.into_iter()
                   .map(|handle| {
                       handle.join()
                             .unwrap_or_else(|_| Err(RuntimeError::TaskFailed { line }))
                   })
                   .collect()
        });

        let mut flow = Flow::Normal;
        for result in results {
            if let returned @ Flow::Return(_) = result?
               && matches!(flow, Flow::Normal)
            {
                flow = returned;
            }
        }
        Ok(flow)
    }
}
