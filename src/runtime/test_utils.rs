//! Test utilities for runtime testing
//!
//! A fluent builder that assembles a single-function module instance in
//! a Store and runs it through a worker, so runtime tests can state
//! instruction sequences and expectations without instantiation noise.

#[cfg(test)]
pub mod test {
    use crate::instruction::{seq, Instruction};
    use crate::module::{FunctionType, ValueType};
    use crate::runtime::memory::MemoryInstance;
    use crate::runtime::store::{FuncAddr, FunctionInstance, GlobalInstance, ModuleInstance, Store};
    use crate::runtime::worker::Worker;
    use crate::runtime::Value;

    /// Test builder for worker tests
    pub struct WorkerTest {
        instructions: Vec<Instruction>,
        args: Vec<Value>,
        locals: Vec<(u32, ValueType)>,
        return_types: Vec<ValueType>,
        with_memory: bool,
        globals: Vec<(Value, bool)>, // (initial value, mutable)
    }

    impl WorkerTest {
        pub fn new() -> Self {
            WorkerTest {
                instructions: Vec::new(),
                args: Vec::new(),
                locals: Vec::new(),
                return_types: Vec::new(),
                with_memory: false,
                globals: Vec::new(),
            }
        }

        /// Append an instruction to the function body
        pub fn inst(mut self, instruction: Instruction) -> Self {
            self.instructions.push(instruction);
            self
        }

        /// Call arguments; their tags become the parameter types
        pub fn args(mut self, args: Vec<Value>) -> Self {
            self.args = args;
            self
        }

        /// Declare a group of zero-initialised locals
        pub fn local(mut self, count: u32, typ: ValueType) -> Self {
            self.locals.push((count, typ));
            self
        }

        pub fn returns(mut self, types: Vec<ValueType>) -> Self {
            self.return_types = types;
            self
        }

        /// Give the module one page of linear memory
        pub fn with_memory(mut self) -> Self {
            self.with_memory = true;
            self
        }

        /// Add a global with an initial value
        pub fn global(mut self, initial_value: Value, mutable: bool) -> Self {
            self.globals.push((initial_value, mutable));
            self
        }

        /// Assemble the Store and the function under test
        pub fn build(self) -> (Store, FuncAddr) {
            let (store, func_addr, _) = self.build_with_args();
            (store, func_addr)
        }

        fn build_with_args(self) -> (Store, FuncAddr, Vec<Value>) {
            let mut store = Store::new();
            let mut module = ModuleInstance::new();

            let parameters: Vec<ValueType> = self.args.iter().map(|v| v.typ()).collect();
            let type_idx =
                module.add_func_type(FunctionType::new(parameters, self.return_types.clone()));

            if self.with_memory {
                let mem_addr = store.allocate_memory(
                    MemoryInstance::new(1, None).expect("memory creation should succeed"),
                );
                module.add_mem_addr(mem_addr);
            }
            for (initial_value, mutable) in &self.globals {
                let global_addr =
                    store.allocate_global(GlobalInstance::new(initial_value.clone(), *mutable));
                module.add_global_addr(global_addr);
            }

            let module_addr = store.allocate_module(module);
            let func_addr = store.allocate_function(FunctionInstance::Guest {
                module_addr,
                type_idx,
                locals: self.locals.clone(),
                body: seq(self.instructions.clone()),
            });
            store
                .get_module_mut(module_addr)
                .expect("module was just allocated")
                .add_func_addr(func_addr);

            (store, func_addr, self.args)
        }

        /// Run the function and assert the final stack, bottom to top
        pub fn expect_stack(self, expected: Vec<Value>) {
            let (store, func_addr, args) = self.build_with_args();
            let mut worker = Worker::new(&store);
            for arg in args {
                worker.stack_mut().push_value(arg);
            }
            worker
                .run_start_function(func_addr)
                .expect("execution should succeed");

            let mut results = Vec::new();
            while worker.stack().depth() > 0 {
                results.push(
                    worker
                        .stack_mut()
                        .pop_value()
                        .expect("only values should remain on the stack"),
                );
            }
            results.reverse();
            assert_eq!(results, expected);
        }

        /// Run the function and assert it fails with a message containing
        /// `error_contains`
        pub fn expect_error(self, error_contains: &str) {
            let (store, func_addr, args) = self.build_with_args();
            let mut worker = Worker::new(&store);
            for arg in args {
                worker.stack_mut().push_value(arg);
            }
            match worker.run_start_function(func_addr) {
                Err(e) => {
                    let error_string = e.to_string();
                    assert!(
                        error_string.contains(error_contains),
                        "expected error containing '{}', got: '{}'",
                        error_contains,
                        error_string
                    );
                }
                Ok(()) => panic!(
                    "expected error containing '{}', but execution succeeded",
                    error_contains
                ),
            }
        }
    }
}
