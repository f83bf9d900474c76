/// A position in the source's processing chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Source,
    Limiter,
    Sink,
}

/// Which optional stages follow the receiver, in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Topology {
    Source,
    SourceLimiter,
    SourceSink,
    SourceLimiterSink,
}

impl Topology {
    pub fn select(limiter: bool, sink: bool) -> Topology {
        match (limiter, sink) {
            (false, false) => Topology::Source,
            (true, false) => Topology::SourceLimiter,
            (false, true) => Topology::SourceSink,
            (true, true) => Topology::SourceLimiterSink,
        }
    }

    /// Stages from upstream to downstream. Never empty, always starts at `Stage::Source`.
    pub fn stages(&self) -> &'static [Stage] {
        match self {
            Topology::Source => &[Stage::Source],
            Topology::SourceLimiter => &[Stage::Source, Stage::Limiter],
            Topology::SourceSink => &[Stage::Source, Stage::Sink],
            Topology::SourceLimiterSink => &[Stage::Source, Stage::Limiter, Stage::Sink],
        }
    }

    /// Consecutive (upstream, downstream) pairs to wire.
    pub fn links(&self) -> Vec<(Stage, Stage)> {
        self.stages().windows(2).map(|w| (w[0], w[1])).collect()
    }

    /// The stage the rest of the receiver attaches to.
    pub fn terminal(&self) -> Stage {
        match self.stages().last() {
            Some(stage) => *stage,
            None => Stage::Source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table() {
        let cases = [
            (false, false, 0, Stage::Source),
            (true, false, 1, Stage::Limiter),
            (false, true, 1, Stage::Sink),
            (true, true, 2, Stage::Sink),
        ];
        for (limiter, sink, links, terminal) in cases.iter() {
            let t = Topology::select(*limiter, *sink);
            assert_eq!(t.stages()[0], Stage::Source);
            assert_eq!(t.links().len(), *links, "{:?}", t);
            assert_eq!(t.terminal(), *terminal, "{:?}", t);
            assert_eq!(t.stages().contains(&Stage::Limiter), *limiter);
            assert_eq!(t.stages().contains(&Stage::Sink), *sink);
        }
    }

    #[test]
    fn limiter_sits_right_after_source() {
        assert_eq!(
            Topology::SourceLimiterSink.links(),
            vec![(Stage::Source, Stage::Limiter), (Stage::Limiter, Stage::Sink)]
        );
    }
}
