mod envelope;
mod scenario;
