use crate::domain::{ComputeArtifact, ComputeRequest, DielecResult};

pub trait ModuleExecutor {
    fn execute(&self, request: &ComputeRequest) -> DielecResult<Vec<ComputeArtifact>>;
}

#[cfg(test)]
mod tests {
    use super::ModuleExecutor;
    use crate::domain::{
        ComputeArtifact, ComputeModule, ComputeRequest, DielecError, DielecErrorCategory,
    };

    struct FailingExecutor;

    impl ModuleExecutor for FailingExecutor {
        fn execute(
            &self,
            _request: &ComputeRequest,
        ) -> crate::domain::DielecResult<Vec<ComputeArtifact>> {
            Err(DielecError::numerical(
                "RUN.MODULE",
                "module execution failed",
            ))
        }
    }

    #[test]
    fn module_executor_uses_shared_error_types() {
        let request = ComputeRequest::new(ComputeModule::Dielec, "dielec.json", "out");
        let error = FailingExecutor
            .execute(&request)
            .expect_err("executor should fail");
        assert_eq!(error.category(), DielecErrorCategory::Numerical);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.placeholder(), "RUN.MODULE");
    }
}
