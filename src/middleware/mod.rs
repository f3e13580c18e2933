/*
 * Responsibility
 * - Cross-cutting HTTP layers (request id, tracing, limits)
 */
pub mod http;
