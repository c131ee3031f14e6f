use alloy::sol;

// TrueTag contract interface. Token ids are keccak256(tagCode); ownerOf
// reverts for ids that were never minted or have been burned.
sol! {
    #[sol(rpc)]
    interface ITrueTag {
        function mintWarehouseBatch(string[] calldata tagCodes) external;

        function mintBatch(string[] calldata tagCodes, uint256 manufacturerId) external;

        function assignTagsToManufacturer(uint256[] calldata tokenIds, uint256 manufacturerId) external;

        function ownerOf(uint256 tokenId) external view returns (address);
    }
}
