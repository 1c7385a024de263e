use ethers::prelude::*;

abigen!(
    IChainlinkAggregator,
    r#"[
        function latestAnswer() external view returns (int256)
        function decimals() external view returns (uint8)
    ]"#
);
