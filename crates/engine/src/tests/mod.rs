//! End-to-end pipeline tests over in-process mock backends.

mod pipeline;
