//! Bundled middleware stages.

pub mod cors;
pub mod helmet;
pub mod logger;
pub mod request_id;

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use bytes::Bytes;
    use hermes_core::{BoxedHandler, Context, Handler, HandlerChain};
    use http::{Method, Request};
    use http_body_util::Empty;

    /// Runs `handler` as the only step of a chain. Returns the context and
    /// whether the handler called `next()`.
    pub(crate) async fn run_with(
        handler: impl Handler,
        method: Method,
        headers: &[(&str, &str)],
    ) -> (Context, bool) {
        let mut builder = Request::builder().method(method).uri("/resource");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Empty::<Bytes>::new()).unwrap();

        let handler: BoxedHandler = Arc::new(handler);
        let mut ctx = Context::new(request, None);
        ctx.replace_chain(HandlerChain::new(vec![Arc::clone(&handler)]));
        handler.call(&mut ctx).await.unwrap();
        let advanced = ctx.chain().cursor() == 1;
        (ctx, advanced)
    }

    pub(crate) async fn run(handler: impl Handler, headers: &[(&str, &str)]) -> (Context, bool) {
        run_with(handler, Method::GET, headers).await
    }
}
