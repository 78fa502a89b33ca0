//! Call dispatch: value conversion around the transport boundary.
//!
//! The dispatcher takes a resolved operation and the caller's named
//! argument values, converts domain-level values (symbolic enum names,
//! wrapped object references) into transport primitives, executes the call
//! on a bounded blocking worker pool, and converts the structured result
//! back. Validation failures are rejected before any transport call is
//! attempted; transport failures propagate without retry.

use std::sync::Arc;

use serde_json::{Map, Value, json};
use tokio::sync::Semaphore;
use tracing::debug;

use gicall_core::{
    CallError, CallableDescriptor, MarshalError, ObjectReference, OperationIdentity,
    TransportError, TypeTag,
};
use gicall_registry::TypeCatalog;

use crate::resolver::{
    ArgumentPlan, CallOperation, FieldGetOperation, FieldPutOperation, OperationResolver,
    ResolvedOperation, ResultConversion, ResultPlan, ValueConversion,
};
use crate::transport::InstrumentationTransport;

/// Named arguments of one incoming call.
pub type CallArguments = Map<String, Value>;

/// Executes resolved operations against the instrumentation transport.
///
/// Native calls may block for an unbounded time, so every transport
/// interaction runs on a blocking worker gated by a semaphore: a hung call
/// occupies one permit, never the scheduler serving other requests. No
/// per-call timeout is enforced.
pub struct CallDispatcher {
    resolver: OperationResolver,
    transport: Arc<dyn InstrumentationTransport>,
    permits: Arc<Semaphore>,
}

impl CallDispatcher {
    /// Create a dispatcher with `workers` concurrent native-call slots.
    pub fn new(
        catalog: Arc<TypeCatalog>,
        transport: Arc<dyn InstrumentationTransport>,
        workers: usize,
    ) -> Self {
        Self {
            resolver: OperationResolver::new(catalog),
            transport,
            permits: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub fn resolver(&self) -> &OperationResolver {
        &self.resolver
    }

    /// Resolve and execute one operation.
    pub async fn dispatch(
        &self,
        identity: &OperationIdentity,
        arguments: &CallArguments,
    ) -> Result<Option<Value>, CallError> {
        let operation = self.resolver.resolve(identity)?;
        debug!(operation = %identity, "dispatching");
        match &*operation {
            ResolvedOperation::Call(call) => self.dispatch_call(call, arguments).await,
            ResolvedOperation::FieldGet(op) => self.dispatch_field_get(op, arguments).await,
            ResolvedOperation::FieldPut(op) => self.dispatch_field_put(op, arguments).await,
            ResolvedOperation::GenericNew { size } => self.dispatch_new(*size).await,
            ResolvedOperation::GenericFree => self.dispatch_free(arguments).await,
            ResolvedOperation::GetType { symbol } => self.dispatch_get_type(symbol).await,
        }
    }

    async fn dispatch_call(
        &self,
        call: &CallOperation,
        arguments: &CallArguments,
    ) -> Result<Option<Value>, CallError> {
        let converted = self.convert_arguments(call, arguments)?;
        let symbol = call.symbol.clone();
        let descriptor = call.descriptor.clone();

        let result = self
            .invoke(move |t| t.call(&symbol, &descriptor, converted))
            .await?;
        Ok(result.map(|value| self.convert_result(&call.results, value)))
    }

    async fn dispatch_field_get(
        &self,
        op: &FieldGetOperation,
        arguments: &CallArguments,
    ) -> Result<Option<Value>, CallError> {
        let ptr = required_reference(arguments, "self")?;
        let (offset, field) = (op.offset, op.field.clone());

        let raw = self
            .invoke(move |t| t.read_field(&ptr, offset, &field))
            .await?;
        let plan = ResultPlan {
            field: "return".to_string(),
            conversion: op.conversion.clone(),
        };
        Ok(Some(self.convert_result(
            std::slice::from_ref(&plan),
            json!({ "return": raw }),
        )))
    }

    async fn dispatch_field_put(
        &self,
        op: &FieldPutOperation,
        arguments: &CallArguments,
    ) -> Result<Option<Value>, CallError> {
        let ptr = required_reference(arguments, "self")?;
        let value = arguments
            .get("value")
            .ok_or_else(|| MarshalError::MissingArgument {
                name: "value".to_string(),
            })?;
        // Reference-typed values are written as their raw pointer.
        let value = match ObjectReference::unwrap_value(value) {
            Some(raw) => raw.clone(),
            None => value.clone(),
        };
        let (offset, field) = (op.offset, op.field.clone());

        self.invoke(move |t| t.write_field(&ptr, offset, &field, value))
            .await?;
        Ok(None)
    }

    async fn dispatch_new(&self, size: usize) -> Result<Option<Value>, CallError> {
        let ptr = self.invoke(move |t| t.alloc(size)).await?;
        Ok(Some(json!({ "return": ObjectReference::new(ptr) })))
    }

    async fn dispatch_free(&self, arguments: &CallArguments) -> Result<Option<Value>, CallError> {
        let ptr = required_reference(arguments, "self")?;
        self.invoke(move |t| t.release(&ptr)).await?;
        Ok(None)
    }

    async fn dispatch_get_type(&self, symbol: &str) -> Result<Option<Value>, CallError> {
        let symbol = symbol.to_string();
        let result = self
            .invoke(move |t| {
                t.call(
                    &symbol,
                    &CallableDescriptor::nullary(TypeTag::Int64),
                    Vec::new(),
                )
            })
            .await?;
        Ok(result)
    }

    /// Pre-call conversion in catalog-declared order, receiver first.
    fn convert_arguments(
        &self,
        call: &CallOperation,
        arguments: &CallArguments,
    ) -> Result<Vec<Value>, CallError> {
        let mut converted = Vec::with_capacity(call.inputs.len() + 1);
        if call.descriptor.is_method {
            let receiver = arguments
                .get("self")
                .ok_or_else(|| MarshalError::MissingArgument {
                    name: "self".to_string(),
                })?;
            converted.push(unwrap_reference(receiver));
        }
        for plan in &call.inputs {
            let value = arguments
                .get(&plan.name)
                .ok_or_else(|| MarshalError::MissingArgument {
                    name: plan.name.clone(),
                })?;
            converted.push(self.convert_argument(plan, value)?);
        }
        Ok(converted)
    }

    fn convert_argument(
        &self,
        plan: &ArgumentPlan,
        value: &Value,
    ) -> Result<Value, MarshalError> {
        match &plan.conversion {
            ValueConversion::EnumToken(enum_name) => match value {
                Value::String(token) => {
                    let mapped = self
                        .resolver
                        .catalog()
                        .enum_mapping(enum_name)
                        .and_then(|m| m.value_of(token));
                    match mapped {
                        Some(integer) => Ok(json!(integer)),
                        None => Err(MarshalError::UnknownEnumValue {
                            name: plan.name.clone(),
                            value: token.clone(),
                            enum_name: enum_name.clone(),
                        }),
                    }
                }
                // Already an integer; pass through unchanged.
                other => Ok(other.clone()),
            },
            ValueConversion::UnwrapReference => Ok(unwrap_reference(value)),
            ValueConversion::Passthrough => Ok(value.clone()),
        }
    }

    /// Post-call conversion of every planned result field.
    fn convert_result(&self, plans: &[ResultPlan], mut result: Value) -> Value {
        let Value::Object(fields) = &mut result else {
            return result;
        };
        for plan in plans {
            let Some(field) = fields.get_mut(&plan.field) else {
                continue;
            };
            match &plan.conversion {
                ResultConversion::WrapReference => {
                    *field = ObjectReference::from_raw(field).into_value();
                }
                ResultConversion::EnumName(enum_name) => {
                    // An integer with no symbolic name stays raw.
                    if let Some(value) = field.as_i64() {
                        if let Some(name) = self
                            .resolver
                            .catalog()
                            .enum_mapping(enum_name)
                            .and_then(|m| m.name_of(value))
                        {
                            *field = json!(name);
                        }
                    }
                }
                ResultConversion::Passthrough => {}
            }
        }
        result
    }

    /// Run one blocking transport interaction on the worker pool.
    async fn invoke<R, F>(&self, operation: F) -> Result<R, CallError>
    where
        R: Send + 'static,
        F: FnOnce(&dyn InstrumentationTransport) -> Result<R, TransportError> + Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| TransportError::WorkerFailed("worker pool closed".to_string()))?;
        let transport = Arc::clone(&self.transport);
        let outcome = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            operation(transport.as_ref())
        })
        .await
        .map_err(|err| TransportError::WorkerFailed(err.to_string()))?;
        outcome.map_err(CallError::from)
    }
}

/// Unwrap a `{"ptr": ...}` reference to its raw pointer, passing raw
/// scalar pointers through unchanged.
fn unwrap_reference(value: &Value) -> Value {
    match ObjectReference::unwrap_value(value) {
        Some(ptr) => ptr.clone(),
        None => value.clone(),
    }
}

/// Extract a mandatory object reference argument as its pointer string.
fn required_reference(arguments: &CallArguments, name: &str) -> Result<String, MarshalError> {
    let value = arguments
        .get(name)
        .ok_or_else(|| MarshalError::MissingArgument {
            name: name.to_string(),
        })?;
    let ptr = ObjectReference::unwrap_value(value).ok_or_else(|| {
        MarshalError::MalformedReference {
            name: name.to_string(),
        }
    })?;
    match ptr {
        Value::String(s) => Ok(s.clone()),
        other => Ok(other.to_string()),
    }
}
