/*!
 * Protocol layer: what we send to the Raygun entries endpoint.
 *
 * - `types`: Payload, Details, ErrorData, StackFrame and friends
 * - `constants`: client identity triple, default endpoint
 */

pub mod constants;
pub mod types;
